//! Rendering of reconciliation results as delimited text.
//!
//! Table mode keeps roster order exactly so that runs can be diffed. Mail
//! mode is the deduplicated, sorted union of all addresses and ignores
//! roster order entirely.
//!
//! An ambiguous member has no resolved account, so any address it picked up
//! from enrichment appears only in mail mode, never in its table row.

use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;

use crate::config::OutputConfig;
use crate::errors::ReportError;
use crate::models::{MatchResult, MatchStatus};

/// Column names for table mode.
pub const TABLE_HEADER: [&str; 5] = ["handle", "full_name", "account", "status", "emails"];

/// Which view of the results to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// One row per member.
    Table,
    /// One address per row, sorted and deduplicated.
    MailOnly,
}

/// Per-status tallies for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub members: usize,
    pub exact: usize,
    pub normalized: usize,
    pub ambiguous: usize,
    pub unmatched: usize,
    /// Members with at least one email after enrichment.
    pub with_email: usize,
}

impl MatchSummary {
    pub fn count(&self, status: MatchStatus) -> usize {
        match status {
            MatchStatus::Exact => self.exact,
            MatchStatus::Normalized => self.normalized,
            MatchStatus::Ambiguous => self.ambiguous,
            MatchStatus::Unmatched => self.unmatched,
        }
    }
}

/// Formats [`MatchResult`]s per the `[output]` config section.
#[derive(Debug, Clone)]
pub struct Reporter {
    delimiter: u8,
    email_separator: String,
    header: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}

impl Reporter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            email_separator: config.email_separator.clone(),
            header: config.header,
        }
    }

    /// Build the output rows without serializing them.
    pub fn render(&self, results: &[MatchResult], mode: ReportMode) -> Vec<Vec<String>> {
        match mode {
            ReportMode::Table => {
                let mut rows = Vec::with_capacity(results.len() + 1);
                if self.header {
                    rows.push(TABLE_HEADER.iter().map(|h| h.to_string()).collect());
                }
                rows.extend(results.iter().map(|r| self.table_row(r)));
                rows
            }
            ReportMode::MailOnly => mail_list(results).into_iter().map(|m| vec![m]).collect(),
        }
    }

    /// Render and write the rows as delimited text, one line per row.
    pub fn write<W: Write>(
        &self,
        results: &[MatchResult],
        mode: ReportMode,
        writer: W,
    ) -> Result<(), ReportError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(writer);
        for row in self.render(results, mode) {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn table_row(&self, result: &MatchResult) -> Vec<String> {
        let emails = match result.status() {
            MatchStatus::Ambiguous => String::new(),
            _ => result.emails.join(&self.email_separator),
        };
        vec![
            result.member.handle.clone(),
            result.member.full_name.clone(),
            result
                .matched()
                .map(|record| record.account.clone())
                .unwrap_or_default(),
            result.status().to_string(),
            emails,
        ]
    }
}

/// Every address across all results, deduplicated and sorted.
pub fn mail_list(results: &[MatchResult]) -> Vec<String> {
    results
        .iter()
        .flat_map(|r| r.emails.iter())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Tally the results by status.
pub fn summarize(results: &[MatchResult]) -> MatchSummary {
    let mut summary = MatchSummary {
        members: results.len(),
        ..Default::default()
    };
    for result in results {
        match result.status() {
            MatchStatus::Exact => summary.exact += 1,
            MatchStatus::Normalized => summary.normalized += 1,
            MatchStatus::Ambiguous => summary.ambiguous += 1,
            MatchStatus::Unmatched => summary.unmatched += 1,
        }
        if !result.emails.is_empty() {
            summary.with_email += 1;
        }
    }
    summary
}
