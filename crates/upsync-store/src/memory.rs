//! In-memory record store.
//!
//! Reference [`RecordStore`] implementation used by tests and examples.
//! Behavior knobs allow simulating per-record rejections and total
//! store outages.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::ids::RecordId;
use crate::record::{Filter, Record, RecordUpdate};
use crate::traits::RecordStore;

struct StoredRow {
    entity: String,
    record: Record,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// In-memory store with configurable failure behavior.
pub struct MemoryStore {
    name: String,
    rows: RwLock<Vec<StoredRow>>,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
    rejections: RwLock<Vec<(String, String)>>,
    query_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create a new empty store with a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            rejections: RwLock::new(Vec::new()),
            query_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make write calls (create/update) fail while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject any written record whose `field` equals `value`, as a
    /// per-record constraint violation.
    pub fn reject_when(&self, field: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut rejections) = self.rejections.write() {
            rejections.push((field.into(), value.into()));
        }
    }

    /// Number of records stored for an entity type.
    pub fn count(&self, entity: &str) -> usize {
        self.rows
            .read()
            .map(|rows| rows.iter().filter(|r| r.entity == entity).count())
            .unwrap_or(0)
    }

    /// Look up a record by surrogate identifier.
    pub fn find(&self, id: &RecordId) -> Option<Record> {
        self.rows.read().ok().and_then(|rows| {
            rows.iter()
                .find(|r| r.record.id.as_ref() == Some(id))
                .map(|r| r.record.clone())
        })
    }

    /// Number of `query` calls issued against this store.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of `batch_create` calls issued against this store.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `batch_update` calls issued against this store.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self, writing: bool) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store is offline"));
        }
        if writing && self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store is rejecting writes"));
        }
        Ok(())
    }

    fn rejection_for(&self, record: &Record) -> Option<StoreError> {
        let rejections = self.rejections.read().ok()?;
        rejections.iter().find_map(|(field, value)| {
            record.fields.get(field).and_then(|v| {
                v.matches_str(value)
                    .then(|| StoreError::constraint_violation(format!("{field}={value} rejected")))
            })
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn store_name(&self) -> &str {
        &self.name
    }

    async fn query(&self, entity: &str, filter: Option<Filter>) -> StoreResult<Vec<Record>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available(false)?;

        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::internal("state lock poisoned"))?;

        Ok(rows
            .iter()
            .filter(|row| row.entity == entity)
            .filter(|row| {
                filter
                    .as_ref()
                    .map(|f| f.matches(&row.record.fields))
                    .unwrap_or(true)
            })
            .map(|row| row.record.clone())
            .collect())
    }

    async fn batch_create(
        &self,
        entity: &str,
        records: Vec<Record>,
    ) -> StoreResult<Vec<Result<RecordId, StoreError>>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available(true)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::internal("state lock poisoned"))?;

        let mut results = Vec::with_capacity(records.len());
        for mut record in records {
            if let Some(rejection) = self.rejection_for(&record) {
                results.push(Err(rejection));
                continue;
            }
            let id = RecordId::random();
            record.id = Some(id.clone());
            let now = Utc::now();
            rows.push(StoredRow {
                entity: entity.to_string(),
                record,
                created_at: now,
                updated_at: now,
            });
            results.push(Ok(id));
        }
        Ok(results)
    }

    async fn batch_update(
        &self,
        updates: Vec<RecordUpdate>,
    ) -> StoreResult<Vec<Result<(), StoreError>>> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available(true)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::internal("state lock poisoned"))?;

        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let row = rows
                .iter_mut()
                .find(|r| r.record.id.as_ref() == Some(&update.id));
            match row {
                Some(row) => {
                    if let Some(rejection) = self.rejection_for(&row.record) {
                        results.push(Err(rejection));
                        continue;
                    }
                    row.record.fields.apply(&update.fields);
                    row.updated_at = Utc::now();
                    results.push(Ok(()));
                }
                None => results.push(Err(StoreError::RecordNotFound { id: update.id })),
            }
        }
        Ok(results)
    }
}
