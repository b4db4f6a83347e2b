// ============================================================================
// Order Store - Persistence boundary for orders
// ============================================================================
//
// Orders are stored as whole documents, one row per order, guarded by a
// version number. `save` is a compare-and-set: it only succeeds when the
// stored version still equals `expected_version`, which turns every
// read-modify-write into an atomic unit.
//
// Implementations:
// - InMemoryOrderStore  (tests, local runs)
// - ScyllaOrderStore    (lightweight transactions on the orders table)
//
// ============================================================================

mod memory;
mod scylla_store;

pub use memory::InMemoryOrderStore;
pub use scylla_store::ScyllaOrderStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::order::OrderAggregate;
use crate::utils::IsTransient;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on order {id}: expected version {expected}")]
    VersionConflict { id: Uuid, expected: i64 },

    #[error("Order store unavailable: {0}")]
    Backend(String),

    #[error("Corrupt order document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders whose delivery date lies in `[start, end]`, both inclusive.
    async fn find_by_delivery_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OrderAggregate>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderAggregate>, StoreError>;

    async fn find_all(&self) -> Result<Vec<OrderAggregate>, StoreError>;

    /// Insert (`expected_version == 0`) or replace the order, provided the
    /// stored version still equals `expected_version`. The order being saved
    /// must already carry its new version.
    async fn save(&self, order: &OrderAggregate, expected_version: i64) -> Result<(), StoreError>;

    /// Returns false when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Used when re-seeding; returns how many orders were removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    async fn count_all(&self) -> Result<u64, StoreError>;
}
