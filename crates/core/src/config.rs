//! TOML-based configuration for rostermail.
//!
//! Every section has serde defaults, so the tool runs without a config file
//! and an empty file is valid. The normalization tables live here rather than
//! in the normalizer so that titles and folds can be extended without
//! touching the matching code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ConfigError, EnrichmentError};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Name normalization tables.
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Public-email enrichment settings.
    #[serde(default)]
    pub enrich: EnrichConfig,

    /// Output formatting.
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Tables driving [`NameNormalizer`](crate::identity::NameNormalizer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Honorific tokens removed wherever they appear, compared
    /// case-insensitively and without a trailing period.
    #[serde(default = "default_titles")]
    pub titles: Vec<String>,

    /// Single characters treated as token separators.
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,

    /// Drop single-letter initials such as the "B." in "Alice B. Carter".
    #[serde(default = "default_true")]
    pub drop_initials: bool,

    /// Extra character folds, applied on top of the built-in table. Keys are
    /// single characters; values are their replacement text.
    #[serde(default)]
    pub folds: BTreeMap<String, String>,
}

fn default_titles() -> Vec<String> {
    ["dr", "prof", "mr", "mrs", "ms", "mx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_separators() -> Vec<String> {
    [",", ".", "-"].iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            titles: default_titles(),
            separators: default_separators(),
            drop_initials: true,
            folds: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Settings for the GitHub public-email lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File holding a personal access token.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Environment variable holding a personal access token.
    #[serde(default)]
    pub token_env: Option<String>,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            token_file: None,
            token_env: None,
        }
    }
}

impl EnrichConfig {
    /// Resolve the enrichment token.
    ///
    /// Precedence: `override_file` (the `--pat` flag), then `token_file`,
    /// then `token_env`. Returns `Ok(None)` when no source is configured,
    /// which disables enrichment. An unreadable token file is fatal.
    pub fn resolve_token(
        &self,
        override_file: Option<&Path>,
    ) -> Result<Option<String>, EnrichmentError> {
        if let Some(path) = override_file.or(self.token_file.as_deref()) {
            debug!(path = %path.display(), "reading enrichment token file");
            let contents = std::fs::read_to_string(path).map_err(|e| {
                EnrichmentError::InvalidCredential(format!(
                    "cannot read token file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            let token = contents.lines().next().unwrap_or("").trim_end_matches('\r');
            return Ok(Some(token.to_string()));
        }

        if let Some(ref env_name) = self.token_env {
            return Ok(resolve_optional_env(env_name, "enrich.token_env"));
        }

        debug!("no enrichment credential configured");
        Ok(None)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Field delimiter for the reconciliation table.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Separator placed between multiple emails inside the emails column.
    #[serde(default = "default_email_separator")]
    pub email_separator: String,

    /// Emit a header row in table mode.
    #[serde(default)]
    pub header: bool,
}

fn default_delimiter() -> String {
    ",".into()
}
fn default_email_separator() -> String {
    ";".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            email_separator: default_email_separator(),
            header: false,
        }
    }
}

impl OutputConfig {
    /// The delimiter as a single byte. Only meaningful after validation.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delimiter = &self.output.delimiter;
        if delimiter.len() != 1 || !delimiter.is_ascii() {
            return Err(ConfigError::InvalidValue {
                field: "output.delimiter".into(),
                detail: format!("must be a single ASCII character, got {:?}", delimiter),
            });
        }
        if self.output.email_separator.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.email_separator".into(),
                detail: "must not be empty".into(),
            });
        }
        if self.output.email_separator.contains(delimiter.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "output.email_separator".into(),
                detail: format!("must not contain the field delimiter {:?}", delimiter),
            });
        }
        if self.enrich.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enrich.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        if let Some(sep) = self.normalize.separators.iter().find(|s| s.chars().count() != 1) {
            return Err(ConfigError::InvalidValue {
                field: "normalize.separators".into(),
                detail: format!("each separator must be one character, got {:?}", sep),
            });
        }
        if self.normalize.titles.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "normalize.titles".into(),
                detail: "titles must not be blank".into(),
            });
        }
        // Separators split names before titles are compared, so a title
        // containing one could never match.
        let separators: Vec<char> = self
            .normalize
            .separators
            .iter()
            .filter_map(|s| s.chars().next())
            .collect();
        if let Some(title) = self.normalize.titles.iter().find(|t| {
            t.trim()
                .trim_end_matches('.')
                .chars()
                .any(|c| c.is_whitespace() || separators.contains(&c))
        }) {
            return Err(ConfigError::InvalidValue {
                field: "normalize.titles".into(),
                detail: format!(
                    "title {:?} contains whitespace or a separator and can never match",
                    title
                ),
            });
        }
        if let Some(key) = self.normalize.folds.keys().find(|k| k.chars().count() != 1) {
            return Err(ConfigError::InvalidValue {
                field: "normalize.folds".into(),
                detail: format!("fold keys must be one character, got {:?}", key),
            });
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}
