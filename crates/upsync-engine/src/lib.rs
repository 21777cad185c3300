//! # Reconciliation & Upsert Engine
//!
//! Natural-key reconciliation against an abstract record store: given a
//! batch of incoming records carrying a business-meaningful key, decide
//! per record whether a match already exists and apply a minimal
//! create/update/link plan in two bulk round-trips.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► ReconcileEngine
//!                │
//!                ├─ query snapshot ─────────► RecordStore
//!                ├─ KeyIndex::build  (key → existing id, first wins)
//!                ├─ Planner::plan    (create / update / link, one entry
//!                │                    per input, duplicates grouped)
//!                └─ Executor::execute
//!                       ├─ phase 1: batch_create ──► RecordStore
//!                       └─ phase 2: batch_update ──► RecordStore
//!                                        │
//! caller ◄── ReconcileReport ◄───────────┘  (one outcome per input)
//! ```
//!
//! The engine issues one snapshot read and two bulk writes per run;
//! it never calls the store per record. Store failures are captured
//! per record and a run reports partial success rather than aborting.
//! Re-running the same input against the resulting store state (with a
//! rebuilt index) produces no duplicate creates.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upsync_engine::{KeySpec, LinkFieldResolver, ReconcileConfig, ReconcileEngine};
//! use upsync_store::{FieldSet, MemoryStore, Record, RecordId};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = ReconcileEngine::new(store, ReconcileConfig::new(KeySpec::field("Name")));
//!
//! let resolver = |record: &Record, target: &RecordId| {
//!     FieldSet::new().with("AccountId", target)
//! };
//!
//! let report = engine
//!     .reconcile("account", incoming_records, &resolver)
//!     .await?;
//! println!("created {}, linked {}", report.summary.created, report.summary.linked);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod index;
pub mod outcome;
pub mod plan;
pub mod planner;

pub use config::{KeySpec, ReconcileConfig, UpsertPolicy};
pub use engine::{ReconcileEngine, ReconcileReport, RunId};
pub use error::{ReconcileError, ReconcileResult};
pub use executor::Executor;
pub use index::KeyIndex;
pub use outcome::{BatchResult, RecordOutcome, RunSummary};
pub use plan::{LinkTarget, MutationPlan, PlanAction, PlanEntry, PlanOp};
pub use planner::{LinkFieldResolver, Planner};
