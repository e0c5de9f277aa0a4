//! Member-to-directory resolution.
//!
//! [`Matcher`] is a pure function of the roster and the [`DirectoryIndex`]:
//! it never compares names partially and never calls out to a network
//! service.

use tracing::{debug, info, warn};

use super::index::DirectoryIndex;
use super::normalizer::NameNormalizer;
use crate::models::{EmailSet, MatchResult, MatchStatus, MemberRecord, Resolution};

/// Resolves roster members against a prebuilt [`DirectoryIndex`].
pub struct Matcher<'a> {
    normalizer: &'a NameNormalizer,
    index: &'a DirectoryIndex,
}

impl<'a> Matcher<'a> {
    pub fn new(normalizer: &'a NameNormalizer, index: &'a DirectoryIndex) -> Self {
        Self { normalizer, index }
    }

    /// Resolve one member.
    ///
    /// A unique candidate is `Exact` when the member's raw name equals one of
    /// the candidate's raw names byte for byte, otherwise `Normalized`. Two or
    /// more candidates yield `Ambiguous` with every candidate retained and no
    /// emails attributed.
    pub fn resolve(&self, member: &MemberRecord) -> MatchResult {
        let key = self.normalizer.normalize(&member.full_name);
        if key.is_empty() {
            debug!(handle = %member.handle, "member name normalizes to nothing");
            return MatchResult::unmatched(member.clone());
        }

        let candidates = self.index.candidates(&key);
        match candidates.as_slice() {
            [] => {
                debug!(handle = %member.handle, key = %key, "no directory match");
                MatchResult::unmatched(member.clone())
            }
            [record] => {
                let record = (*record).clone();
                let emails = record.emails.clone();
                let resolution = if record.names().any(|name| name == member.full_name) {
                    Resolution::Exact(record)
                } else {
                    Resolution::Normalized(record)
                };
                debug!(
                    handle = %member.handle,
                    status = %resolution.status(),
                    emails = emails.len(),
                    "matched directory record"
                );
                MatchResult {
                    member: member.clone(),
                    resolution,
                    emails,
                }
            }
            many => {
                let accounts: Vec<&str> = many.iter().map(|r| r.account.as_str()).collect();
                warn!(
                    handle = %member.handle,
                    name = %member.full_name,
                    candidates = %accounts.join(", "),
                    "ambiguous directory match, needs manual resolution"
                );
                MatchResult {
                    member: member.clone(),
                    resolution: Resolution::Ambiguous(many.iter().map(|r| (*r).clone()).collect()),
                    emails: EmailSet::new(),
                }
            }
        }
    }

    /// Resolve every member, preserving roster order and cardinality.
    pub fn resolve_all(&self, members: &[MemberRecord]) -> Vec<MatchResult> {
        let results: Vec<MatchResult> = members.iter().map(|m| self.resolve(m)).collect();

        let count = |status: MatchStatus| results.iter().filter(|r| r.status() == status).count();
        info!(
            members = results.len(),
            exact = count(MatchStatus::Exact),
            normalized = count(MatchStatus::Normalized),
            ambiguous = count(MatchStatus::Ambiguous),
            unmatched = count(MatchStatus::Unmatched),
            "resolved roster against directory"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectoryRecord;

    fn run(members: &[MemberRecord], directory: Vec<DirectoryRecord>) -> Vec<MatchResult> {
        let normalizer = NameNormalizer::default();
        let index = DirectoryIndex::build(directory, &normalizer);
        Matcher::new(&normalizer, &index).resolve_all(members)
    }

    #[test]
    fn test_titled_member_matches_normalized() {
        let results = run(
            &[MemberRecord::new("alice", "Dr. Alice B. Carter")],
            vec![DirectoryRecord::new("acarter", "Alice Carter").with_emails(["alice@example.org"])],
        );

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.status(), MatchStatus::Normalized);
        assert_eq!(result.matched().map(|r| r.account.as_str()), Some("acarter"));
        assert_eq!(result.emails.iter().collect::<Vec<_>>(), vec!["alice@example.org"]);
    }

    #[test]
    fn test_identical_names_match_exact() {
        let results = run(
            &[MemberRecord::new("bob", "Bob Builder")],
            vec![DirectoryRecord::new("bbuilder", "Bob Builder").with_emails(["bob@example.org"])],
        );
        assert_eq!(results[0].status(), MatchStatus::Exact);
    }

    #[test]
    fn test_identical_alias_matches_exact() {
        let mut record = DirectoryRecord::new("bbuilder", "Robert Builder");
        record.aliases.push("Bob Builder".into());
        let results = run(&[MemberRecord::new("bob", "Bob Builder")], vec![record]);
        assert_eq!(results[0].status(), MatchStatus::Exact);
    }

    #[test]
    fn test_shared_key_is_ambiguous_without_emails() {
        let results = run(
            &[MemberRecord::new("jsmith", "John Smith")],
            vec![
                DirectoryRecord::new("jsmith1", "John Smith").with_emails(["one@example.org"]),
                DirectoryRecord::new("jsmith2", "Smith John").with_emails(["two@example.org"]),
            ],
        );

        let result = &results[0];
        assert_eq!(result.status(), MatchStatus::Ambiguous);
        assert!(result.matched().is_none());
        assert!(result.emails.is_empty());
        let accounts: Vec<&str> = result.candidates().iter().map(|r| r.account.as_str()).collect();
        assert_eq!(accounts, vec!["jsmith1", "jsmith2"]);
    }

    #[test]
    fn test_unknown_member_is_unmatched() {
        let results = run(
            &[MemberRecord::new("zed", "Zed Nobody")],
            vec![DirectoryRecord::new("acarter", "Alice Carter")],
        );
        assert_eq!(results[0].status(), MatchStatus::Unmatched);
        assert!(results[0].emails.is_empty());
    }

    #[test]
    fn test_blank_member_never_matches_blank_directory_name() {
        let results = run(
            &[MemberRecord::new("blank", "  ")],
            vec![DirectoryRecord::new("ghost", "")],
        );
        assert_eq!(results[0].status(), MatchStatus::Unmatched);
    }

    #[test]
    fn test_matched_record_without_emails() {
        let results = run(
            &[MemberRecord::new("carol", "Carol Danvers")],
            vec![DirectoryRecord::new("cdanvers", "Carol Danvers")],
        );
        assert_eq!(results[0].status(), MatchStatus::Exact);
        assert!(results[0].emails.is_empty());
    }

    #[test]
    fn test_cardinality_and_order_preserved() {
        let members = vec![
            MemberRecord::new("c", "Carol Danvers"),
            MemberRecord::new("a", "Alice Carter"),
            MemberRecord::new("x", ""),
            MemberRecord::new("a2", "Alice Carter"),
        ];
        let results = run(&members, vec![DirectoryRecord::new("acarter", "Alice Carter")]);

        assert_eq!(results.len(), members.len());
        let handles: Vec<&str> = results.iter().map(|r| r.member.handle.as_str()).collect();
        assert_eq!(handles, vec!["c", "a", "x", "a2"]);
    }
}
