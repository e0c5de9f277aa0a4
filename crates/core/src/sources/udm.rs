//! Parser for UCS directory dumps as printed by `udm users/user list`.
//!
//! Each record starts with a `DN:` line and continues with indented
//! `attribute: value` lines:
//!
//! ```text
//! DN: uid=acarter,cn=users,dc=example,dc=org
//!   displayName: Alice Carter
//!   e-mail: alice@example.org
//!   mailForwardAddress: alice.carter@mail.example.org
//!   gecos: Alice Carter
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, info};

use super::ParseOutcome;
use crate::errors::InputError;
use crate::models::DirectoryRecord;

const SOURCE: &str = "directory";

static UID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^uid=([^,]+)(?:,|$)").expect("uid pattern is valid"));

/// Utilities for loading a UDM user dump.
pub struct UdmDump;

impl UdmDump {
    /// Load and parse a dump from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ParseOutcome<DirectoryRecord>, InputError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading directory dump");

        if !path.exists() {
            return Err(InputError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Parse dump text. Never fails as a whole; bad `DN:` lines are skipped
    /// together with their attributes.
    pub fn parse(contents: &str) -> ParseOutcome<DirectoryRecord> {
        let mut outcome = ParseOutcome::default();
        let mut current: Option<DirectoryRecord> = None;

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim_end_matches('\r');

            if let Some(dn) = line.strip_prefix("DN: ") {
                if let Some(record) = current.take() {
                    outcome.records.push(finish(record));
                }
                match UID_PATTERN.captures(dn.trim()) {
                    Some(caps) => current = Some(DirectoryRecord::new(&caps[1], "")),
                    None => outcome.skip(InputError::MalformedRecord {
                        source_name: SOURCE.into(),
                        line: idx + 1,
                        detail: format!("DN without uid: {}", dn.trim()),
                    }),
                }
                continue;
            }

            let Some(record) = current.as_mut() else {
                continue;
            };
            let Some((attr, value)) = line.trim_start().split_once(':') else {
                continue;
            };
            let value = value.trim();

            match attr {
                "displayName" => record.full_name = value.to_string(),
                "gecos" => {
                    if !value.is_empty() && !record.aliases.iter().any(|a| a == value) {
                        record.aliases.push(value.to_string());
                    }
                }
                "mailForwardAddress" => record.emails.insert_preferred(value),
                "e-mail" => {
                    record.emails.insert(value);
                }
                _ => {}
            }
        }

        if let Some(record) = current.take() {
            outcome.records.push(finish(record));
        }

        debug!(
            records = outcome.records.len(),
            skipped = outcome.skipped.len(),
            "parsed directory dump"
        );
        outcome
    }
}

/// Drop an alias that merely repeats the display name.
fn finish(mut record: DirectoryRecord) -> DirectoryRecord {
    let name = record.full_name.clone();
    record.aliases.retain(|alias| *alias != name);
    record
}
