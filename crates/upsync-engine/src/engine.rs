//! Reconciliation engine orchestrator.
//!
//! Main entry point: snapshot query, index build, planning, and
//! two-phase execution as one sequential run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use upsync_store::{Record, RecordStore};

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::executor::Executor;
use crate::index::KeyIndex;
use crate::outcome::{BatchResult, RunSummary};
use crate::plan::MutationPlan;
use crate::planner::{LinkFieldResolver, Planner};

/// Unique identifier for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Report for one completed reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Run ID.
    pub run_id: RunId,
    /// Entity type that was reconciled.
    pub entity: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run completed.
    pub completed_at: DateTime<Utc>,
    /// Aggregate counts.
    pub summary: RunSummary,
    /// Per-record outcomes, in input order.
    pub result: BatchResult,
}

/// Reconciliation engine over a record store.
///
/// A run is synchronous and sequential: build index from a snapshot
/// query, plan, execute creates, execute updates — exactly three store
/// round-trips. The index and plan are single-run value objects; the
/// engine holds no state between runs and performs no retries of its
/// own.
pub struct ReconcileEngine<S> {
    store: Arc<S>,
    config: ReconcileConfig,
}

impl<S: RecordStore> ReconcileEngine<S> {
    /// Create an engine over a store.
    pub fn new(store: Arc<S>, config: ReconcileConfig) -> Self {
        Self { store, config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile a batch of incoming records against the store.
    ///
    /// Fails fast with [`ReconcileError::Validation`] before touching
    /// the store when any incoming record has no natural key, and with
    /// [`ReconcileError::StoreUnavailable`] when the snapshot query
    /// fails; in both cases nothing has been written. Once execution
    /// starts the run always completes and reports per-record partial
    /// success in the returned report.
    pub async fn reconcile(
        &self,
        entity: &str,
        incoming: Vec<Record>,
        resolver: &dyn LinkFieldResolver,
    ) -> ReconcileResult<ReconcileReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let planner = Planner::new(&self.config.key_spec);

        // fail fast before any store call; plan reuses the keys
        let keys = planner.validate(&incoming)?;

        tracing::info!(
            run_id = %run_id,
            entity,
            incoming = incoming.len(),
            "starting reconciliation run"
        );

        let index = self.snapshot_index(entity).await?;
        let plan = planner.plan(incoming, keys, &index, resolver);
        let result = Executor::new(self.config.policy)
            .execute(self.store.as_ref(), entity, plan, resolver)
            .await;

        let summary = result.summary();
        tracing::info!(
            run_id = %run_id,
            entity,
            created = summary.created,
            updated = summary.updated,
            linked = summary.linked,
            skipped = summary.skipped,
            failed = summary.failed,
            "reconciliation run finished"
        );

        Ok(ReconcileReport {
            run_id,
            entity: entity.to_string(),
            started_at,
            completed_at: Utc::now(),
            summary,
            result,
        })
    }

    /// Dry run: produce the mutation plan without executing it.
    pub async fn preview(
        &self,
        entity: &str,
        incoming: Vec<Record>,
        resolver: &dyn LinkFieldResolver,
    ) -> ReconcileResult<MutationPlan> {
        let planner = Planner::new(&self.config.key_spec);
        let keys = planner.validate(&incoming)?;

        let index = self.snapshot_index(entity).await?;
        Ok(planner.plan(incoming, keys, &index, resolver))
    }

    async fn snapshot_index(&self, entity: &str) -> ReconcileResult<KeyIndex> {
        let existing = self
            .store
            .query(entity, self.config.snapshot_filter.clone())
            .await
            .map_err(|e| ReconcileError::store_unavailable(&e))?;

        Ok(KeyIndex::build(&existing, &self.config.key_spec))
    }
}
