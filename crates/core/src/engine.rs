//! Reconciliation pipeline.
//!
//! The [`ReconcileEngine`] wires the stages together for one run:
//!
//! 1. Load the roster and, optionally, the directory dump.
//! 2. Normalize every directory name into the [`DirectoryIndex`].
//! 3. Resolve each roster member against the index.
//! 4. Optionally enrich members that still have no email.
//! 5. Hand the results to a [`Reporter`].
//!
//! Every stage but enrichment is pure and in memory.

use std::path::Path;

use tracing::info;

use crate::config::AppConfig;
use crate::enrich::{EnrichStats, MailEnricher, PublicEmailProvider};
use crate::errors::{CoreError, InputError};
use crate::identity::{DirectoryIndex, Matcher, NameNormalizer};
use crate::models::{DirectoryRecord, MatchResult, MemberRecord};
use crate::report::Reporter;
use crate::sources::{RosterFile, UdmDump};

/// Parsed inputs for one run, plus whatever was skipped while reading them.
#[derive(Debug, Default)]
pub struct Inputs {
    pub members: Vec<MemberRecord>,
    pub directory: Vec<DirectoryRecord>,
    pub skipped: Vec<InputError>,
}

/// Drives one reconciliation run from a validated [`AppConfig`].
pub struct ReconcileEngine {
    config: AppConfig,
    normalizer: NameNormalizer,
}

impl ReconcileEngine {
    pub fn new(config: AppConfig) -> Self {
        let normalizer = NameNormalizer::new(&config.normalize);
        info!("initializing reconcile engine");
        Self { config, normalizer }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::new(&self.config.output)
    }

    /// Read the roster and optional directory dump from disk.
    ///
    /// Missing or unparseable files are fatal; individual bad entries are
    /// collected in [`Inputs::skipped`].
    pub fn load_inputs(
        &self,
        roster: &Path,
        directory: Option<&Path>,
    ) -> Result<Inputs, CoreError> {
        let roster = RosterFile::load(roster)?;
        let mut inputs = Inputs {
            members: roster.records,
            directory: Vec::new(),
            skipped: roster.skipped,
        };
        if let Some(path) = directory {
            let dump = UdmDump::load(path)?;
            inputs.directory = dump.records;
            inputs.skipped.extend(dump.skipped);
        }
        info!(
            members = inputs.members.len(),
            directory = inputs.directory.len(),
            skipped = inputs.skipped.len(),
            "inputs loaded"
        );
        Ok(inputs)
    }

    pub fn index(&self, directory: Vec<DirectoryRecord>) -> DirectoryIndex {
        DirectoryIndex::build(directory, &self.normalizer)
    }

    /// Resolve every member, in roster order. Always returns exactly one
    /// result per member.
    pub fn reconcile(
        &self,
        members: &[MemberRecord],
        directory: Vec<DirectoryRecord>,
    ) -> Vec<MatchResult> {
        let index = self.index(directory);
        Matcher::new(&self.normalizer, &index).resolve_all(members)
    }

    /// Fill empty email sets from `provider`, one member at a time.
    pub async fn enrich<P: PublicEmailProvider>(
        &self,
        results: &mut [MatchResult],
        provider: P,
    ) -> EnrichStats {
        let mut enricher = MailEnricher::new(provider);
        enricher.enrich_all(results).await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;

    #[test]
    fn test_reconcile_keeps_roster_order_and_cardinality() {
        let engine = ReconcileEngine::new(AppConfig::default());
        let members = vec![
            MemberRecord::new("zed", "Zed Zulu"),
            MemberRecord::new("alice", "Dr. Alice B. Carter"),
            MemberRecord::new("zed2", "Zed Zulu"),
        ];
        let directory = vec![
            DirectoryRecord::new("acarter", "Alice Carter").with_emails(["alice@example.org"]),
        ];
        let results = engine.reconcile(&members, directory);

        assert_eq!(results.len(), 3);
        let handles: Vec<&str> = results.iter().map(|r| r.member.handle.as_str()).collect();
        assert_eq!(handles, vec!["zed", "alice", "zed2"]);
        assert_eq!(results[1].status(), MatchStatus::Normalized);
        assert_eq!(results[1].matched().map(|r| r.account.as_str()), Some("acarter"));
        assert_eq!(results[0].status(), MatchStatus::Unmatched);
    }

    #[test]
    fn test_reconcile_without_directory() {
        let engine = ReconcileEngine::new(AppConfig::default());
        let members = vec![MemberRecord::new("alice", "Alice Carter")];
        let results = engine.reconcile(&members, Vec::new());
        assert_eq!(results[0].status(), MatchStatus::Unmatched);
        assert!(results[0].emails.is_empty());
    }

    #[test]
    fn test_load_inputs_missing_roster() {
        let engine = ReconcileEngine::new(AppConfig::default());
        let result = engine.load_inputs(Path::new("/nonexistent/data.yaml"), None);
        assert!(matches!(
            result,
            Err(CoreError::Input(InputError::FileNotFound(_)))
        ));
    }
}
