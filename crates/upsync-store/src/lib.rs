//! # Record Store Contract
//!
//! Abstract persistence collaborator consumed by the upsync
//! reconciliation engine.
//!
//! A [`RecordStore`] is a keyed record collection with three bulk
//! operations: snapshot reads (`query`), order-preserving batch creates,
//! and order-preserving batch updates. Both write calls allow per-record
//! partial failure — one rejected record never blocks its siblings.
//!
//! ## Crate Organization
//!
//! - [`ids`] - Type-safe identifiers ([`RecordId`])
//! - [`record`] - Value types (`Record`, `FieldSet`, `NaturalKey`, `Filter`)
//! - [`error`] - Error types with transient/permanent classification
//! - [`traits`] - The [`RecordStore`] contract
//! - [`memory`] - In-memory reference store for tests and examples
//!
//! ## Example
//!
//! ```
//! use upsync_store::prelude::*;
//!
//! let account = Record::new(FieldSet::new().with("Name", "Doe"))
//!     .with_key(NaturalKey::single("Doe").expect("non-empty key"));
//! assert!(account.id.is_none());
//! ```

pub mod error;
pub mod ids;
pub mod memory;
pub mod record;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use upsync_store::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::ids::RecordId;
    pub use crate::memory::MemoryStore;
    pub use crate::record::{FieldSet, FieldValue, Filter, NaturalKey, Record, RecordUpdate};
    pub use crate::traits::RecordStore;
}

pub use error::{StoreError, StoreResult};
pub use ids::RecordId;
pub use memory::MemoryStore;
pub use record::{FieldSet, FieldValue, Filter, NaturalKey, Record, RecordUpdate};
pub use traits::RecordStore;

// Re-export async_trait for store implementors
pub use async_trait::async_trait;
