//! Readers for the two identity sources.
//!
//! - [`roster`]: the organization roster (github-manager `data.yaml`)
//! - [`udm`]: the user directory dump (`udm users/user list` output)
//!
//! Both skip malformed entries instead of failing; the skipped entries are
//! returned alongside the parsed records so callers can report them.

pub mod roster;
pub mod udm;

pub use roster::RosterFile;
pub use udm::UdmDump;

use crate::errors::InputError;

/// Records parsed from a source plus the entries that had to be skipped.
#[derive(Debug)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub skipped: Vec<InputError>,
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> ParseOutcome<T> {
    /// Record a skipped entry, logging it as it happens.
    pub(crate) fn skip(&mut self, error: InputError) {
        tracing::warn!("{}", error);
        self.skipped.push(error);
    }
}
