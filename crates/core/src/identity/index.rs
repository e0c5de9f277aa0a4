//! Normalized-key lookup over the directory.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::normalizer::{NameNormalizer, NormalizedKey};
use crate::models::DirectoryRecord;

/// Read-only map from [`NormalizedKey`] to every directory record sharing it.
///
/// Buckets are lists so that collisions stay visible to the matcher. Within
/// a bucket records keep their directory order, and an account appears at
/// most once even when both its display name and an alias produce the key.
/// Repeated entries for one account are merged into its first entry.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    records: Vec<DirectoryRecord>,
    buckets: HashMap<NormalizedKey, Vec<usize>>,
    unindexed: usize,
}

impl DirectoryIndex {
    /// Index every record under the keys of its display name and aliases.
    /// Records whose names all normalize to the empty key are kept out.
    pub fn build(records: Vec<DirectoryRecord>, normalizer: &NameNormalizer) -> Self {
        let records = merge_duplicate_accounts(records);
        let mut buckets: HashMap<NormalizedKey, Vec<usize>> = HashMap::new();
        let mut unindexed = 0;

        for (idx, record) in records.iter().enumerate() {
            let mut usable = false;
            for name in record.names() {
                let key = normalizer.normalize(name);
                if key.is_empty() {
                    continue;
                }
                usable = true;
                let bucket = buckets.entry(key).or_default();
                if !bucket.contains(&idx) {
                    bucket.push(idx);
                }
            }
            if !usable {
                unindexed += 1;
                debug!(account = %record.account, "directory record has no usable name");
            }
        }

        info!(
            records = records.len(),
            keys = buckets.len(),
            unindexed,
            "built directory index"
        );

        Self {
            records,
            buckets,
            unindexed,
        }
    }

    /// Every record filed under `key`, in directory order. Empty keys never
    /// have candidates.
    pub fn candidates(&self, key: &NormalizedKey) -> Vec<&DirectoryRecord> {
        if key.is_empty() {
            return Vec::new();
        }
        self.buckets
            .get(key)
            .map(|bucket| bucket.iter().map(|&idx| &self.records[idx]).collect())
            .unwrap_or_default()
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of records the index was built from, indexed or not.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Records that could not be indexed because every name was blank.
    pub fn unindexed_count(&self) -> usize {
        self.unindexed
    }

    /// Keys shared by more than one account, sorted. Useful for reporting
    /// collisions before any member is matched.
    pub fn colliding_keys(&self) -> Vec<&NormalizedKey> {
        let mut keys: Vec<&NormalizedKey> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.len() > 1)
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }
}

/// Fold later entries for an account into its first entry: their names
/// become aliases and their emails are appended.
fn merge_duplicate_accounts(records: Vec<DirectoryRecord>) -> Vec<DirectoryRecord> {
    let mut merged: Vec<DirectoryRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(&pos) = positions.get(&record.account) else {
            positions.insert(record.account.clone(), merged.len());
            merged.push(record);
            continue;
        };
        warn!(
            account = %record.account,
            "directory lists the account more than once, merging into the first entry"
        );
        let first = &mut merged[pos];
        for name in record.names() {
            if !name.trim().is_empty()
                && name != first.full_name
                && !first.aliases.iter().any(|alias| alias == name)
            {
                first.aliases.push(name.to_string());
            }
        }
        for email in record.emails.iter() {
            first.emails.insert(email);
        }
    }
    merged
}
