//! Domain model types used throughout rostermail.
//!
//! These types bridge the input sources, the matching engine, enrichment,
//! and the reporter.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One organization member as listed in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Roster handle (GitHub login).
    pub handle: String,
    /// Display name as written in the roster.
    pub full_name: String,
}

impl MemberRecord {
    pub fn new(handle: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            full_name: full_name.into(),
        }
    }
}

/// One account from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Directory account id (the `uid`).
    pub account: String,
    /// Primary display name.
    pub full_name: String,
    /// Alternative display names for the same account.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Every address attached to the account, preferred first.
    #[serde(default)]
    pub emails: EmailSet,
}

impl DirectoryRecord {
    pub fn new(account: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            full_name: full_name.into(),
            aliases: Vec::new(),
            emails: EmailSet::default(),
        }
    }

    /// Builder-style helper used by sources and tests.
    pub fn with_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for email in emails {
            self.emails.insert(email);
        }
        self
    }

    /// Every name this record may be matched under: the primary name first,
    /// then aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.full_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Email set
// ---------------------------------------------------------------------------

/// Insertion-ordered set of email addresses.
///
/// Duplicates are ignored; blank values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailSet(Vec<String>);

impl EmailSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an address unless it is blank or already present. Returns
    /// whether the set changed.
    pub fn insert(&mut self, email: impl Into<String>) -> bool {
        let email = email.into();
        let email = email.trim();
        if email.is_empty() || self.contains(email) {
            return false;
        }
        self.0.push(email.to_string());
        true
    }

    /// Put an address at the front, moving it there if already present.
    pub fn insert_preferred(&mut self, email: impl Into<String>) {
        let email = email.into();
        let email = email.trim();
        if email.is_empty() {
            return;
        }
        self.0.retain(|e| e != email);
        self.0.insert(0, email.to_string());
    }

    pub fn contains(&self, email: &str) -> bool {
        self.0.iter().any(|e| e == email)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The preferred address, if any.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

impl<S: Into<String>> FromIterator<S> for EmailSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = EmailSet::new();
        for email in iter {
            set.insert(email);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Match outcome
// ---------------------------------------------------------------------------

/// How a member was resolved against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Raw names identical.
    Exact,
    /// Normalized keys equal, raw names differ.
    Normalized,
    /// Key shared by two or more directory accounts.
    Ambiguous,
    /// Key found nowhere in the directory.
    Unmatched,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 4] = [
        Self::Exact,
        Self::Normalized,
        Self::Ambiguous,
        Self::Unmatched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Normalized => "normalized",
            Self::Ambiguous => "ambiguous",
            Self::Unmatched => "unmatched",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The directory side of a match.
///
/// Ambiguity carries every candidate and never a single "best guess".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "records", rename_all = "snake_case")]
pub enum Resolution {
    Exact(DirectoryRecord),
    Normalized(DirectoryRecord),
    Ambiguous(Vec<DirectoryRecord>),
    Unmatched,
}

impl Resolution {
    pub fn status(&self) -> MatchStatus {
        match self {
            Self::Exact(_) => MatchStatus::Exact,
            Self::Normalized(_) => MatchStatus::Normalized,
            Self::Ambiguous(_) => MatchStatus::Ambiguous,
            Self::Unmatched => MatchStatus::Unmatched,
        }
    }
}

/// Per-member outcome of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub member: MemberRecord,
    pub resolution: Resolution,
    /// Emails attributed to the member. Empty for ambiguous results until
    /// enrichment.
    pub emails: EmailSet,
}

impl MatchResult {
    pub fn unmatched(member: MemberRecord) -> Self {
        Self {
            member,
            resolution: Resolution::Unmatched,
            emails: EmailSet::new(),
        }
    }

    pub fn status(&self) -> MatchStatus {
        self.resolution.status()
    }

    /// The single matched directory record, if the match was unique.
    pub fn matched(&self) -> Option<&DirectoryRecord> {
        match &self.resolution {
            Resolution::Exact(record) | Resolution::Normalized(record) => Some(record),
            Resolution::Ambiguous(_) | Resolution::Unmatched => None,
        }
    }

    /// Candidate accounts left for manual resolution.
    pub fn candidates(&self) -> &[DirectoryRecord] {
        match &self.resolution {
            Resolution::Ambiguous(records) => records,
            _ => &[],
        }
    }
}
