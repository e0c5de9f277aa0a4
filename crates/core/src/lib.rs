//! rostermail core library.
//!
//! This crate reconciles an organization roster against a user directory:
//! configuration, source parsers, name normalization and matching, optional
//! public-email enrichment, and report rendering.

pub mod config;
pub mod engine;
pub mod enrich;
pub mod errors;
pub mod identity;
pub mod models;
pub mod report;
pub mod sources;

// Re-exports for convenience.
pub use config::AppConfig;
pub use engine::ReconcileEngine;
pub use enrich::{GitHubProfileProvider, MailEnricher, PublicEmailProvider};
pub use identity::{DirectoryIndex, Matcher, NameNormalizer, NormalizedKey};
pub use models::{DirectoryRecord, EmailSet, MatchResult, MatchStatus, MemberRecord, Resolution};
pub use report::{ReportMode, Reporter};
