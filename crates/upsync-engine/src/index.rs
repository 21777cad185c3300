//! Key index: natural key to surrogate identifier, built once per run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use upsync_store::{NaturalKey, Record, RecordId};

use crate::config::KeySpec;

/// In-memory mapping from natural key to existing record identifier.
///
/// Built in one pass from a snapshot query result and read-only after
/// construction. The index does not track later store changes; rebuild
/// it for every run.
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: HashMap<NaturalKey, RecordId>,
    duplicates: u32,
    skipped: u32,
}

impl KeyIndex {
    /// Build an index from records read from the store.
    ///
    /// O(n) over the input with O(1) average lookups afterwards. On a
    /// duplicate key the first occurrence wins; duplicates and records
    /// without an identifier or extractable key are counted and logged,
    /// never fatal.
    pub fn build(existing: &[Record], spec: &KeySpec) -> Self {
        let mut index = KeyIndex {
            entries: HashMap::with_capacity(existing.len()),
            duplicates: 0,
            skipped: 0,
        };

        for record in existing {
            let Some(id) = &record.id else {
                tracing::warn!("skipping snapshot record without identifier");
                index.skipped += 1;
                continue;
            };
            let Some(key) = spec.key_of(record) else {
                tracing::warn!(id = %id, "skipping snapshot record without natural key");
                index.skipped += 1;
                continue;
            };
            match index.entries.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(id.clone());
                }
                Entry::Occupied(entry) => {
                    tracing::warn!(
                        key = %entry.key(),
                        kept = %entry.get(),
                        ignored = %id,
                        "duplicate natural key in snapshot, keeping first"
                    );
                    index.duplicates += 1;
                }
            }
        }

        index
    }

    /// Look up the identifier for a key.
    pub fn get(&self, key: &NaturalKey) -> Option<&RecordId> {
        self.entries.get(key)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of duplicate keys dropped during the build.
    pub fn duplicate_count(&self) -> u32 {
        self.duplicates
    }

    /// Number of snapshot records skipped during the build.
    pub fn skipped_count(&self) -> u32 {
        self.skipped
    }
}
