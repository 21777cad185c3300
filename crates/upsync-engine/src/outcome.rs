//! Per-record outcomes and run summaries.

use serde::{Deserialize, Serialize};

use upsync_store::RecordId;

use crate::error::ReconcileError;

/// Outcome of reconciling one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// A new record was created with the assigned identifier.
    Created { id: RecordId },

    /// The matched record was updated.
    Updated { id: RecordId },

    /// The record was attached to the matched (or same-batch created)
    /// identifier.
    Linked { id: RecordId },

    /// The match produced no field changes and the policy skipped the
    /// write.
    Skipped { id: RecordId },

    /// The record was not applied.
    Failed { error: ReconcileError },
}

impl RecordOutcome {
    /// Check if the record was applied (or deliberately skipped).
    pub fn is_success(&self) -> bool {
        !matches!(self, RecordOutcome::Failed { .. })
    }

    /// The assigned or confirmed identifier, when successful.
    pub fn id(&self) -> Option<&RecordId> {
        match self {
            RecordOutcome::Created { id }
            | RecordOutcome::Updated { id }
            | RecordOutcome::Linked { id }
            | RecordOutcome::Skipped { id } => Some(id),
            RecordOutcome::Failed { .. } => None,
        }
    }

    /// The failure, when not successful.
    pub fn error(&self) -> Option<&ReconcileError> {
        match self {
            RecordOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// One outcome per input record, in input order.
///
/// A run always completes and reports partial success; inspect
/// [`BatchResult::failed`] to detect records that need attention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    pub(crate) fn new(outcomes: Vec<RecordOutcome>) -> Self {
        Self { outcomes }
    }

    /// The outcomes, ordered by input position (not execution order).
    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    /// Outcome for the input record at `index`.
    pub fn get(&self, index: usize) -> Option<&RecordOutcome> {
        self.outcomes.get(index)
    }

    /// Number of input records.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of successfully applied (or skipped) records.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed records.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Check if every record was applied.
    pub fn is_fully_applied(&self) -> bool {
        self.failed() == 0
    }

    /// Aggregate counts for reporting.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.outcomes.len() as u32,
            ..RunSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome {
                RecordOutcome::Created { .. } => summary.created += 1,
                RecordOutcome::Updated { .. } => summary.updated += 1,
                RecordOutcome::Linked { .. } => summary.linked += 1,
                RecordOutcome::Skipped { .. } => summary.skipped += 1,
                RecordOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Aggregate counts for one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Input batch size.
    #[serde(default)]
    pub total: u32,
    /// Records created.
    #[serde(default)]
    pub created: u32,
    /// Records updated.
    #[serde(default)]
    pub updated: u32,
    /// Records linked.
    #[serde(default)]
    pub linked: u32,
    /// No-op writes skipped by policy.
    #[serde(default)]
    pub skipped: u32,
    /// Records that failed.
    #[serde(default)]
    pub failed: u32,
}
