//! Batch upsert executor: applies a mutation plan in two bulk phases.

use std::collections::HashMap;

use upsync_store::{FieldSet, RecordId, RecordStore, RecordUpdate};

use crate::config::UpsertPolicy;
use crate::error::ReconcileError;
use crate::outcome::{BatchResult, RecordOutcome};
use crate::plan::{LinkTarget, MutationPlan, PlanOp};
use crate::planner::LinkFieldResolver;

enum WriteKind {
    Update { target: RecordId },
    Link { target: RecordId },
    /// Field write back onto the source of a Create entry (the source
    /// pre-exists elsewhere and now references the created record).
    /// Success keeps the Created outcome from phase 1.
    BackLink,
}

struct PendingWrite {
    input_index: usize,
    write_to: RecordId,
    fields: FieldSet,
    kind: WriteKind,
}

/// Applies a mutation plan against a record store.
///
/// Phase 1 submits every Create in one bulk call to obtain surrogate
/// identifiers; phase 2 resolves same-batch links against those
/// identifiers and submits every Update/Link in a second bulk call.
/// Store failures are captured per record; the run always completes
/// and reports partial success. Phase-1 creates are never rolled back
/// on later failure — a run is safe to repeat once the store recovers,
/// provided the key index is rebuilt.
pub struct Executor {
    policy: UpsertPolicy,
}

impl Executor {
    /// Create an executor with the given no-op write policy.
    pub fn new(policy: UpsertPolicy) -> Self {
        Self { policy }
    }

    /// Apply `plan` to `store`, creating records under `entity`.
    ///
    /// Returns exactly one outcome per plan entry, ordered by input
    /// position regardless of execution order.
    pub async fn execute<S>(
        &self,
        store: &S,
        entity: &str,
        plan: MutationPlan,
        resolver: &dyn LinkFieldResolver,
    ) -> BatchResult
    where
        S: RecordStore + ?Sized,
    {
        let entries = plan.into_entries();
        let mut outcomes: Vec<Option<RecordOutcome>> = entries.iter().map(|_| None).collect();

        // Phase 1: bulk create, collecting assigned identifiers.
        let create_indices: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e.op, PlanOp::Create))
            .map(|(i, _)| i)
            .collect();
        let mut assigned: HashMap<usize, RecordId> = HashMap::new();

        if !create_indices.is_empty() {
            let records = create_indices
                .iter()
                .map(|&i| {
                    let mut record = entries[i].record.clone();
                    record.id = None;
                    record
                })
                .collect();

            match store.batch_create(entity, records).await {
                Ok(results) => {
                    for (pos, &i) in create_indices.iter().enumerate() {
                        let slot = &mut outcomes[entries[i].input_index];
                        *slot = Some(match results.get(pos) {
                            Some(Ok(id)) => {
                                assigned.insert(i, id.clone());
                                RecordOutcome::Created { id: id.clone() }
                            }
                            Some(Err(error)) => RecordOutcome::Failed {
                                error: ReconcileError::record_rejected(error),
                            },
                            None => RecordOutcome::Failed {
                                error: ReconcileError::StoreUnavailable {
                                    message: "store returned no result for record".to_string(),
                                },
                            },
                        });
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "create phase failed as a whole");
                    let failure = ReconcileError::store_unavailable(&error);
                    for &i in &create_indices {
                        outcomes[entries[i].input_index] = Some(RecordOutcome::Failed {
                            error: failure.clone(),
                        });
                    }
                }
            }
        }

        // Phase 2: resolve link targets and bulk update.
        let mut writes: Vec<PendingWrite> = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            match &entry.op {
                PlanOp::Create => {
                    let (Some(own), Some(created)) = (&entry.record.id, assigned.get(&i)) else {
                        continue;
                    };
                    let fields = resolver.link_fields(&entry.record, created);
                    if !fields.is_empty() {
                        writes.push(PendingWrite {
                            input_index: entry.input_index,
                            write_to: own.clone(),
                            fields,
                            kind: WriteKind::BackLink,
                        });
                    }
                }
                PlanOp::Update { target, fields } => {
                    if fields.is_empty() && self.policy == UpsertPolicy::SkipNoOp {
                        outcomes[entry.input_index] = Some(RecordOutcome::Skipped {
                            id: target.clone(),
                        });
                        continue;
                    }
                    writes.push(PendingWrite {
                        input_index: entry.input_index,
                        write_to: target.clone(),
                        fields: fields.clone(),
                        kind: WriteKind::Update {
                            target: target.clone(),
                        },
                    });
                }
                PlanOp::Link { target, fields } => {
                    let resolved = match target {
                        LinkTarget::Existing { id } => id.clone(),
                        LinkTarget::Pending { entry: create_idx } => {
                            match assigned.get(create_idx) {
                                Some(id) => id.clone(),
                                None => {
                                    outcomes[entry.input_index] = Some(RecordOutcome::Failed {
                                        error: ReconcileError::LinkTargetFailed {
                                            key: entry.key.clone(),
                                        },
                                    });
                                    continue;
                                }
                            }
                        }
                    };
                    let fields = match fields {
                        Some(fields) => fields.clone(),
                        None => resolver.link_fields(&entry.record, &resolved),
                    };
                    if fields.is_empty() && self.policy == UpsertPolicy::SkipNoOp {
                        outcomes[entry.input_index] =
                            Some(RecordOutcome::Skipped { id: resolved });
                        continue;
                    }
                    // a source with its own identity receives the linkage
                    // fields; a same-batch duplicate merges onto the
                    // canonical record
                    let write_to = entry.record.id.clone().unwrap_or_else(|| resolved.clone());
                    writes.push(PendingWrite {
                        input_index: entry.input_index,
                        write_to,
                        fields,
                        kind: WriteKind::Link { target: resolved },
                    });
                }
            }
        }

        if !writes.is_empty() {
            let updates = writes
                .iter()
                .map(|w| RecordUpdate::new(w.write_to.clone(), w.fields.clone()))
                .collect();

            match store.batch_update(updates).await {
                Ok(results) => {
                    for (pos, write) in writes.iter().enumerate() {
                        let slot = &mut outcomes[write.input_index];
                        match results.get(pos) {
                            Some(Ok(())) => match &write.kind {
                                WriteKind::Update { target } => {
                                    *slot = Some(RecordOutcome::Updated {
                                        id: target.clone(),
                                    });
                                }
                                WriteKind::Link { target } => {
                                    *slot = Some(RecordOutcome::Linked {
                                        id: target.clone(),
                                    });
                                }
                                WriteKind::BackLink => {}
                            },
                            Some(Err(error)) => {
                                *slot = Some(RecordOutcome::Failed {
                                    error: ReconcileError::record_rejected(error),
                                });
                            }
                            None => {
                                *slot = Some(RecordOutcome::Failed {
                                    error: ReconcileError::StoreUnavailable {
                                        message: "store returned no result for record"
                                            .to_string(),
                                    },
                                });
                            }
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "update phase failed as a whole");
                    let failure = ReconcileError::store_unavailable(&error);
                    for write in &writes {
                        // a failed back-link also fails its record: the row
                        // was created but the linkage did not apply
                        outcomes[write.input_index] = Some(RecordOutcome::Failed {
                            error: failure.clone(),
                        });
                    }
                }
            }
        }

        debug_assert!(outcomes.iter().all(Option::is_some));
        BatchResult::new(
            outcomes
                .into_iter()
                .map(|outcome| {
                    outcome.unwrap_or_else(|| RecordOutcome::Failed {
                        error: ReconcileError::StoreUnavailable {
                            message: "record was never submitted".to_string(),
                        },
                    })
                })
                .collect(),
        )
    }
}
