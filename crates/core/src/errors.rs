//! Error types for the rostermail core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Errors from reading the roster and directory sources.
///
/// [`InputError::MalformedRecord`] is per-record and never aborts a load;
/// the other variants mean the whole source is unusable.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file not found.
    #[error("input file not found: {0}")]
    FileNotFound(String),

    /// The document as a whole could not be parsed.
    #[error("failed to parse {source_name} '{path}': {detail}")]
    Parse {
        source_name: String,
        path: String,
        detail: String,
    },

    /// A single entry was missing required fields or was badly formed.
    #[error("skipping malformed {source_name} entry at {line}: {detail}")]
    MalformedRecord {
        source_name: String,
        line: usize,
        detail: String,
    },

    /// Generic I/O wrapper.
    #[error("input I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Enrichment errors
// ---------------------------------------------------------------------------

/// Errors from the optional public-email enrichment provider.
///
/// Everything except [`EnrichmentError::InvalidCredential`] is scoped to a
/// single lookup: the member simply gets no extra email.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// The credential cannot be used at all. Fatal before any lookup.
    #[error("invalid enrichment credential: {0}")]
    InvalidCredential(String),

    /// HTTP-level transport error (network, TLS, etc.).
    #[error("profile lookup HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The per-call timeout expired.
    #[error("profile lookup for '{handle}' timed out after {secs}s")]
    Timeout { handle: String, secs: u64 },

    /// The provider rejected the credential.
    #[error("profile lookup unauthorized: {0}")]
    Unauthorized(String),

    /// Access to this profile was refused for a reason other than quota.
    #[error("profile lookup forbidden: {0}")]
    Forbidden(String),

    /// Rate limit exceeded.
    #[error("profile API rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// The API returned another non-success status code.
    #[error("profile API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// JSON deserialization failure.
    #[error("profile response parse error: {0}")]
    Parse(String),
}

impl EnrichmentError {
    /// Whether this failure means no further lookup can succeed this run.
    pub fn halts_enrichment(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential(_) | Self::Unauthorized(_) | Self::RateLimited { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors from writing the reconciliation output.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The delimited-text writer failed.
    #[error("failed to write report row: {0}")]
    Csv(#[from] csv::Error),

    /// Generic I/O wrapper.
    #[error("report I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
