//! Reconciliation planner: classifies incoming records against the key
//! index into an ordered mutation plan.

use std::collections::HashMap;

use upsync_store::{FieldSet, NaturalKey, Record, RecordId};

use crate::config::KeySpec;
use crate::error::{ReconcileError, ReconcileResult};
use crate::index::KeyIndex;
use crate::plan::{LinkTarget, MutationPlan, PlanEntry, PlanOp};

/// Decides which fields get written when an incoming record matches an
/// existing one.
///
/// This externalizes the business-specific "what to update" decision
/// from the generic matching algorithm: reassign a foreign key only if
/// it differs, refresh a subset of fields, or return an empty set to
/// signal a no-op (see `UpsertPolicy`).
pub trait LinkFieldResolver: Send + Sync {
    /// Compute the field-update-set for `record` matched to `target`.
    fn link_fields(&self, record: &Record, target: &RecordId) -> FieldSet;
}

impl<F> LinkFieldResolver for F
where
    F: Fn(&Record, &RecordId) -> FieldSet + Send + Sync,
{
    fn link_fields(&self, record: &Record, target: &RecordId) -> FieldSet {
        self(record, target)
    }
}

/// Classifies a batch of incoming records into create/update/link
/// mutations.
pub struct Planner<'a> {
    key_spec: &'a KeySpec,
}

impl<'a> Planner<'a> {
    /// Create a planner over a key specification.
    pub fn new(key_spec: &'a KeySpec) -> Self {
        Self { key_spec }
    }

    /// Extract and validate the natural key of every incoming record.
    ///
    /// Fails with [`ReconcileError::Validation`] on the first record
    /// that yields no key; a record without a key can be neither matched
    /// nor deduplicated, so the whole batch is aborted before any store
    /// call.
    pub fn validate(&self, incoming: &[Record]) -> ReconcileResult<Vec<NaturalKey>> {
        incoming
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.key_spec
                    .key_of(record)
                    .ok_or_else(|| ReconcileError::validation(index, "record has no natural key"))
            })
            .collect()
    }

    /// Produce the mutation plan for a batch.
    ///
    /// `keys` is the output of [`Planner::validate`] for the same batch:
    /// one key per record, in input order. Classification per record:
    /// - key not in the index, first occurrence in the batch: Create;
    /// - key in the index: Update, or Link when the record carries its
    ///   own identifier distinct from the match (cross-entity linkage);
    /// - key already classified earlier in the batch: Link against the
    ///   identifier the first record resolved to (or will receive, for
    ///   a same-batch Create).
    ///
    /// Exactly one entry is emitted per input record.
    pub fn plan(
        &self,
        incoming: Vec<Record>,
        keys: Vec<NaturalKey>,
        index: &KeyIndex,
        resolver: &dyn LinkFieldResolver,
    ) -> MutationPlan {
        debug_assert_eq!(incoming.len(), keys.len());

        let mut entries: Vec<PlanEntry> = Vec::with_capacity(incoming.len());
        // natural key -> plan index of the entry that first claimed it
        let mut claimed: HashMap<NaturalKey, usize> = HashMap::new();

        for (input_index, (record, key)) in incoming.into_iter().zip(keys).enumerate() {
            let op = if let Some(&first) = claimed.get(&key) {
                Self::follow(first, &entries[first].op, &record, resolver)
            } else if let Some(existing) = index.get(&key) {
                claimed.insert(key.clone(), input_index);
                let fields = resolver.link_fields(&record, existing);
                match &record.id {
                    Some(own) if own != existing => PlanOp::Link {
                        target: LinkTarget::Existing {
                            id: existing.clone(),
                        },
                        fields: Some(fields),
                    },
                    _ => PlanOp::Update {
                        target: existing.clone(),
                        fields,
                    },
                }
            } else {
                claimed.insert(key.clone(), input_index);
                PlanOp::Create
            };

            entries.push(PlanEntry {
                input_index,
                key,
                record,
                op,
            });
        }

        let plan = MutationPlan::new(entries);
        tracing::debug!(
            creates = plan.creates(),
            updates = plan.updates(),
            links = plan.links(),
            "built mutation plan"
        );
        plan
    }

    /// Classify a record whose key was already claimed earlier in the
    /// batch: it links to whatever the first record resolved to.
    fn follow(
        first: usize,
        first_op: &PlanOp,
        record: &Record,
        resolver: &dyn LinkFieldResolver,
    ) -> PlanOp {
        match first_op {
            PlanOp::Create => PlanOp::Link {
                target: LinkTarget::Pending { entry: first },
                fields: None,
            },
            PlanOp::Update { target, .. } => PlanOp::Link {
                target: LinkTarget::Existing { id: target.clone() },
                fields: Some(resolver.link_fields(record, target)),
            },
            PlanOp::Link { target, .. } => match target {
                LinkTarget::Existing { id } => PlanOp::Link {
                    target: LinkTarget::Existing { id: id.clone() },
                    fields: Some(resolver.link_fields(record, id)),
                },
                LinkTarget::Pending { entry } => PlanOp::Link {
                    target: LinkTarget::Pending { entry: *entry },
                    fields: None,
                },
            },
        }
    }
}
