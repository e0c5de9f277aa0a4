//! Best-effort public-email enrichment.
//!
//! After matching, members that still have no email can be looked up by
//! handle in a profile service. The service is injected as a
//! [`PublicEmailProvider`], so the enricher itself never touches the network
//! and tests can drive it with a stub.
//!
//! Failures are per member: the member keeps an empty email set and the run
//! continues. Once the provider reports that the credential is invalid or
//! exhausted, the enricher stops calling it for the rest of the run.

pub mod github;

use std::future::Future;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::EnrichmentError;
use crate::models::MatchResult;

pub use github::GitHubProfileProvider;

/// A source of public email addresses keyed by roster handle.
pub trait PublicEmailProvider {
    /// `Ok(None)` covers both "no such user" and "no public email".
    fn lookup_public_email(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<Option<String>, EnrichmentError>> + Send;
}

/// What happened to a single result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The result already had an email; no lookup was made.
    AlreadyHasEmail,
    /// The provider supplied an address.
    Added,
    /// The provider had nothing to offer.
    NotFound,
    /// The lookup failed; the result is unchanged.
    Failed,
    /// Enrichment was halted earlier in the run; no lookup was made.
    Halted,
}

/// Counters for one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    pub lookups: usize,
    pub added: usize,
    pub not_found: usize,
    pub failed: usize,
    pub skipped: usize,
    pub halted: usize,
}

/// Applies a [`PublicEmailProvider`] to match results, one at a time.
pub struct MailEnricher<P> {
    provider: P,
    halted: bool,
    stats: EnrichStats,
}

impl<P: PublicEmailProvider> MailEnricher<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            halted: false,
            stats: EnrichStats::default(),
        }
    }

    /// Look up an email for `result` if, and only if, its email set is empty.
    ///
    /// Never removes or replaces an existing address and never changes the
    /// match status, so ambiguous results stay ambiguous.
    pub async fn enrich(&mut self, result: &mut MatchResult) -> EnrichOutcome {
        if !result.emails.is_empty() {
            self.stats.skipped += 1;
            return EnrichOutcome::AlreadyHasEmail;
        }
        if self.halted {
            self.stats.halted += 1;
            return EnrichOutcome::Halted;
        }

        let handle = result.member.handle.as_str();
        self.stats.lookups += 1;
        match self.provider.lookup_public_email(handle).await {
            Ok(Some(email)) if result.emails.insert(email.trim()) => {
                debug!(handle, status = %result.status(), "added public email");
                self.stats.added += 1;
                EnrichOutcome::Added
            }
            Ok(_) => {
                debug!(handle, "no public email");
                self.stats.not_found += 1;
                EnrichOutcome::NotFound
            }
            Err(e) => {
                self.stats.failed += 1;
                if e.halts_enrichment() {
                    warn!(handle, error = %e, "stopping enrichment for the rest of this run");
                    self.halted = true;
                } else {
                    warn!(handle, error = %e, "public email lookup failed");
                }
                EnrichOutcome::Failed
            }
        }
    }

    /// Enrich every result in order.
    pub async fn enrich_all(&mut self, results: &mut [MatchResult]) -> &EnrichStats {
        for result in results.iter_mut() {
            self.enrich(result).await;
        }
        info!(
            lookups = self.stats.lookups,
            added = self.stats.added,
            failed = self.stats.failed,
            halted = self.halted,
            "enrichment finished"
        );
        &self.stats
    }

    pub fn stats(&self) -> &EnrichStats {
        &self.stats
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::{DirectoryRecord, EmailSet, MatchStatus, MemberRecord, Resolution};

    enum Reply {
        Email(&'static str),
        Nothing,
        Transient,
        Unauthorized,
    }

    struct StubProvider {
        replies: HashMap<String, Reply>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(replies: Vec<(&'static str, Reply)>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|(handle, reply)| (handle.to_string(), reply))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PublicEmailProvider for StubProvider {
        async fn lookup_public_email(
            &self,
            handle: &str,
        ) -> Result<Option<String>, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(handle) {
                Some(Reply::Email(email)) => Ok(Some(email.to_string())),
                Some(Reply::Nothing) | None => Ok(None),
                Some(Reply::Transient) => Err(EnrichmentError::Timeout {
                    handle: handle.to_string(),
                    secs: 10,
                }),
                Some(Reply::Unauthorized) => {
                    Err(EnrichmentError::Unauthorized("HTTP 401".into()))
                }
            }
        }
    }

    fn unmatched(handle: &str) -> MatchResult {
        MatchResult::unmatched(MemberRecord::new(handle, "Some Name"))
    }

    #[tokio::test]
    async fn test_fills_only_empty_results() {
        let provider = StubProvider::new(vec![
            ("alice", Reply::Email("alice@users.example.com")),
            ("bob", Reply::Email("bob@users.example.com")),
        ]);
        let mut enricher = MailEnricher::new(provider);

        let record = DirectoryRecord::new("bbuilder", "Bob Builder").with_emails(["bob@example.org"]);
        let mut results = vec![
            unmatched("alice"),
            MatchResult {
                member: MemberRecord::new("bob", "Bob Builder"),
                emails: record.emails.clone(),
                resolution: Resolution::Exact(record),
            },
        ];
        enricher.enrich_all(&mut results).await;

        assert_eq!(results[0].emails.first(), Some("alice@users.example.com"));
        assert_eq!(results[0].status(), MatchStatus::Unmatched);
        assert_eq!(
            results[1].emails.iter().collect::<Vec<_>>(),
            vec!["bob@example.org"]
        );
        assert_eq!(enricher.provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(enricher.stats().added, 1);
        assert_eq!(enricher.stats().skipped, 1);
    }

    #[tokio::test]
    async fn test_ambiguous_stays_ambiguous() {
        let provider = StubProvider::new(vec![("jsmith", Reply::Email("john@users.example.com"))]);
        let mut enricher = MailEnricher::new(provider);

        let mut result = MatchResult {
            member: MemberRecord::new("jsmith", "John Smith"),
            resolution: Resolution::Ambiguous(vec![
                DirectoryRecord::new("jsmith1", "John Smith"),
                DirectoryRecord::new("jsmith2", "Smith John"),
            ]),
            emails: EmailSet::new(),
        };
        let outcome = enricher.enrich(&mut result).await;

        assert_eq!(outcome, EnrichOutcome::Added);
        assert_eq!(result.status(), MatchStatus::Ambiguous);
        assert!(result.matched().is_none());
        assert_eq!(result.emails.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_continues() {
        let provider = StubProvider::new(vec![
            ("flaky", Reply::Transient),
            ("quiet", Reply::Nothing),
            ("carol", Reply::Email("carol@users.example.com")),
        ]);
        let mut enricher = MailEnricher::new(provider);
        let mut results = vec![unmatched("flaky"), unmatched("quiet"), unmatched("carol")];
        let stats = enricher.enrich_all(&mut results).await.clone();

        assert!(results[0].emails.is_empty());
        assert!(results[1].emails.is_empty());
        assert_eq!(results[2].emails.first(), Some("carol@users.example.com"));
        assert_eq!(
            stats,
            EnrichStats {
                lookups: 3,
                added: 1,
                not_found: 1,
                failed: 1,
                skipped: 0,
                halted: 0,
            }
        );
        assert!(!enricher.is_halted());
    }

    #[tokio::test]
    async fn test_unauthorized_halts_remaining_lookups() {
        let provider = StubProvider::new(vec![
            ("first", Reply::Unauthorized),
            ("second", Reply::Email("second@users.example.com")),
        ]);
        let mut enricher = MailEnricher::new(provider);
        let mut results = vec![unmatched("first"), unmatched("second"), unmatched("third")];
        enricher.enrich_all(&mut results).await;

        assert!(enricher.is_halted());
        assert!(results.iter().all(|r| r.emails.is_empty()));
        assert_eq!(enricher.provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(enricher.stats().halted, 2);
    }

    #[tokio::test]
    async fn test_blank_email_is_not_added() {
        let provider = StubProvider::new(vec![("blank", Reply::Email("   "))]);
        let mut enricher = MailEnricher::new(provider);
        let mut result = unmatched("blank");

        assert_eq!(enricher.enrich(&mut result).await, EnrichOutcome::NotFound);
        assert!(result.emails.is_empty());
    }
}
