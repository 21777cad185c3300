//! Mutation plan value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use upsync_store::{FieldSet, NaturalKey, Record, RecordId};

/// Target of a link entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkTarget {
    /// A record that already exists in the store.
    Existing { id: RecordId },

    /// A record created earlier in the same batch; `entry` is the plan
    /// index of its Create entry. Resolved to an identifier once phase 1
    /// has run.
    Pending { entry: usize },
}

/// The mutation planned for one incoming record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanOp {
    /// Create a new record with all provided fields. Never references a
    /// pre-existing identifier.
    Create,

    /// Re-upsert a matched record: write `fields` to `target`.
    Update { target: RecordId, fields: FieldSet },

    /// Attach the incoming record to `target`. Fields are resolved at
    /// plan time for existing targets and at execution time for pending
    /// ones (the identifier does not exist earlier).
    Link {
        target: LinkTarget,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<FieldSet>,
    },
}

/// Classification tag of a plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    Link,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAction::Create => write!(f, "create"),
            PlanAction::Update => write!(f, "update"),
            PlanAction::Link => write!(f, "link"),
        }
    }
}

/// One planned mutation; exactly one exists per input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Position of the source record in the input batch.
    pub input_index: usize,

    /// Natural key the record was classified under.
    pub key: NaturalKey,

    /// The source record.
    pub record: Record,

    /// The planned mutation.
    pub op: PlanOp,
}

impl PlanEntry {
    /// Classification tag of this entry.
    pub fn action(&self) -> PlanAction {
        match self.op {
            PlanOp::Create => PlanAction::Create,
            PlanOp::Update { .. } => PlanAction::Update,
            PlanOp::Link { .. } => PlanAction::Link,
        }
    }
}

/// Ordered list of planned mutations for one batch.
///
/// Single-run value object: produced by the planner, consumed by the
/// executor, discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationPlan {
    entries: Vec<PlanEntry>,
}

impl MutationPlan {
    pub(crate) fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    /// The plan entries, in input order.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Consume the plan.
    pub fn into_entries(self) -> Vec<PlanEntry> {
        self.entries
    }

    /// Number of entries (equals the input batch size).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of Create entries.
    pub fn creates(&self) -> usize {
        self.count(PlanAction::Create)
    }

    /// Number of Update entries.
    pub fn updates(&self) -> usize {
        self.count(PlanAction::Update)
    }

    /// Number of Link entries.
    pub fn links(&self) -> usize {
        self.count(PlanAction::Link)
    }

    fn count(&self, action: PlanAction) -> usize {
        self.entries.iter().filter(|e| e.action() == action).count()
    }
}
