//! Engine configuration: key extraction and match-write policy.

use serde::{Deserialize, Serialize};

use upsync_store::{Filter, NaturalKey, Record};

/// Declares how the natural key of a record is obtained.
///
/// An explicit key on the record always wins; otherwise the named fields
/// are read in order to form a (possibly composite) key. A record is
/// unmatchable when any key field is missing or blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Field names read, in order, to form the key.
    pub fields: Vec<String>,

    /// Whether keys are folded to lowercase before comparison.
    ///
    /// Exact string matching is the contract; case folding is an
    /// explicit opt-in, applied uniformly to explicit and derived keys.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl KeySpec {
    /// Key specification over a single field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            fields: vec![name.into()],
            case_insensitive: false,
        }
    }

    /// Key specification over multiple fields, in order.
    pub fn fields(names: Vec<String>) -> Self {
        Self {
            fields: names,
            case_insensitive: false,
        }
    }

    /// Enable case-insensitive matching.
    #[must_use]
    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Extract the natural key of a record, or `None` when the record
    /// carries no explicit key and its key fields are missing or blank.
    pub fn key_of(&self, record: &Record) -> Option<NaturalKey> {
        if let Some(key) = &record.key {
            return Some(self.normalize(key.clone()));
        }

        let mut components = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            components.push(record.fields.get_string(field)?.to_string());
        }
        NaturalKey::composite(components).map(|key| self.normalize(key))
    }

    fn normalize(&self, key: NaturalKey) -> NaturalKey {
        if self.case_insensitive {
            key.to_lowercase()
        } else {
            key
        }
    }
}

/// Policy for matched records whose resolved field-update-set is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertPolicy {
    /// Always submit the write, even when there is nothing to change.
    /// Matches the behavior of a plain re-upsert.
    #[default]
    AlwaysWrite,

    /// Skip the empty write and report the record as `Skipped`.
    SkipNoOp,
}

/// Configuration for a reconciliation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// How natural keys are extracted from records, on both sides.
    pub key_spec: KeySpec,

    /// What to do with no-op writes on matched records.
    #[serde(default)]
    pub policy: UpsertPolicy,

    /// Optional filter applied to the snapshot query that seeds the
    /// key index. `None` indexes the whole entity collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_filter: Option<Filter>,
}

impl ReconcileConfig {
    /// Create a configuration with the given key specification and
    /// default policy.
    pub fn new(key_spec: KeySpec) -> Self {
        Self {
            key_spec,
            policy: UpsertPolicy::default(),
            snapshot_filter: None,
        }
    }

    /// Set the match-write policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UpsertPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the snapshot query filter.
    #[must_use]
    pub fn with_snapshot_filter(mut self, filter: Filter) -> Self {
        self.snapshot_filter = Some(filter);
        self
    }
}
