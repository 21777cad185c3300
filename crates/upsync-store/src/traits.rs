//! Record store contract.
//!
//! The reconciliation engine consumes this contract; it never talks to a
//! concrete backend directly.

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::ids::RecordId;
use crate::record::{Filter, Record, RecordUpdate};

/// Abstract keyed record collection with bulk write capability.
///
/// Implementations may be remote and latency-bound; callers are expected
/// to issue bulk calls rather than per-record calls. The contract defines
/// no retry or timeout behavior of its own — implementations own that
/// policy and surface exhaustion as [`StoreError::Unavailable`] or
/// [`StoreError::Timeout`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get the display name for this store instance.
    fn store_name(&self) -> &str;

    /// Snapshot read of an entity collection.
    ///
    /// The result is eventually consistent with prior writes from the
    /// same caller. Records in the result always carry their surrogate
    /// identifier.
    ///
    /// # Arguments
    /// * `entity` - The entity type to read (e.g., "account")
    /// * `filter` - Optional query-by-field filter; `None` reads everything
    async fn query(&self, entity: &str, filter: Option<Filter>) -> StoreResult<Vec<Record>>;

    /// Create a batch of records in one round-trip.
    ///
    /// The result is order-preserving: one entry per submitted record, in
    /// submission order. A rejected record does not block its siblings
    /// (partial failure). An outer `Err` means the round-trip as a whole
    /// failed and nothing can be assumed applied.
    ///
    /// # Arguments
    /// * `entity` - The entity type the records belong to
    /// * `records` - Records to create; any `id` on them is ignored
    ///
    /// # Returns
    /// The assigned surrogate identifier per record, or the per-record
    /// rejection.
    async fn batch_create(
        &self,
        entity: &str,
        records: Vec<Record>,
    ) -> StoreResult<Vec<Result<RecordId, StoreError>>>;

    /// Apply a batch of field updates in one round-trip.
    ///
    /// Targets are addressed by surrogate identifier alone; identifiers
    /// are unique across entity types. Order-preserving, partial failure
    /// allowed, same outer-error semantics as [`RecordStore::batch_create`].
    async fn batch_update(
        &self,
        updates: Vec<RecordUpdate>,
    ) -> StoreResult<Vec<Result<(), StoreError>>>;
}
