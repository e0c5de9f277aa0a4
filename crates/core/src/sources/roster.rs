//! Roster reader for github-manager org data files.
//!
//! The file format:
//!
//! ```yaml
//! members:
//!   - login: alice
//!     name: Dr. Alice B. Carter
//!   - login: bob
//!     name: Bob Builder
//! ```
//!
//! Other top-level keys (teams, repositories, ...) and other member fields
//! are ignored.

use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, info, warn};

use super::ParseOutcome;
use crate::errors::InputError;
use crate::models::MemberRecord;

const SOURCE: &str = "roster";

/// Utilities for loading the roster file.
pub struct RosterFile;

impl RosterFile {
    /// Load the roster from disk, in file order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ParseOutcome<MemberRecord>, InputError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading roster");

        if !path.exists() {
            return Err(InputError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parse roster YAML. `label` names the document in error messages.
    pub fn parse(contents: &str, label: &str) -> Result<ParseOutcome<MemberRecord>, InputError> {
        if contents.trim().is_empty() {
            warn!(path = label, "roster file is empty");
            return Ok(ParseOutcome::default());
        }

        let doc: Value = serde_yaml::from_str(contents).map_err(|e| InputError::Parse {
            source_name: SOURCE.into(),
            path: label.to_string(),
            detail: e.to_string(),
        })?;

        let mut outcome = ParseOutcome::default();
        let members = match doc.get("members") {
            Some(Value::Sequence(members)) => members,
            Some(Value::Null) | None => {
                warn!(path = label, "roster has no members");
                return Ok(outcome);
            }
            Some(_) => {
                return Err(InputError::Parse {
                    source_name: SOURCE.into(),
                    path: label.to_string(),
                    detail: "'members' is not a list".into(),
                });
            }
        };

        for (idx, entry) in members.iter().enumerate() {
            let position = idx + 1;
            let login = string_field(entry, "login");
            let name = string_field(entry, "name");
            match (login, name) {
                (Some(login), Some(name)) => outcome.records.push(MemberRecord::new(login, name)),
                (None, _) => outcome.skip(InputError::MalformedRecord {
                    source_name: SOURCE.into(),
                    line: position,
                    detail: "missing 'login'".into(),
                }),
                (Some(login), None) => outcome.skip(InputError::MalformedRecord {
                    source_name: SOURCE.into(),
                    line: position,
                    detail: format!("missing 'name' for '{}'", login),
                }),
            }
        }

        debug!(
            members = outcome.records.len(),
            skipped = outcome.skipped.len(),
            "parsed roster"
        );
        Ok(outcome)
    }
}

/// A non-blank string field of a mapping entry, trimmed.
fn string_field<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
