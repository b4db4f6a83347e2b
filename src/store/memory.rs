use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::OrderAggregate;
use super::{OrderStore, StoreError};

/// Process-local store. The write lock makes the version check and the
/// write a single step.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, OrderAggregate>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_delivery_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OrderAggregate>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.delivery_date >= start && o.delivery_date <= end)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderAggregate>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<OrderAggregate>, StoreError> {
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn save(&self, order: &OrderAggregate, expected_version: i64) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;

        let current_version = orders.get(&order.id).map(|o| o.version).unwrap_or(0);
        if current_version != expected_version {
            return Err(StoreError::VersionConflict {
                id: order.id,
                expected: expected_version,
            });
        }

        orders.insert(order.id, order.clone());

        tracing::debug!(
            order_id = %order.id,
            version = order.version,
            "Saved order"
        );

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut orders = self.orders.write().await;
        let removed = orders.len() as u64;
        orders.clear();
        Ok(removed)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.orders.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures::{day, qty, stored_order};

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(10, day(20), 0);

        store.save(&order, 0).await.unwrap();

        let found = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(found, order);
        assert_eq!(store.count_all().await.unwrap(), 1);
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(10, day(20), 0);
        store.save(&order, 0).await.unwrap();

        // Second insert of the same id
        let err = store.save(&order, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 0, .. }));

        let mut updated = order.clone();
        updated.append_confirmation(qty(3), day(2)).unwrap();
        updated.version = 2;
        store.save(&updated, 1).await.unwrap();

        // Writer that read version 1 loses
        let mut stale = order.clone();
        stale.append_confirmation(qty(5), day(2)).unwrap();
        stale.version = 2;
        let err = store.save(&stale, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { expected: 1, .. }));

        let stored = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_confirmed(), qty(3));
    }

    #[tokio::test]
    async fn test_delivery_window_is_inclusive() {
        let store = InMemoryOrderStore::new();
        for d in [9, 10, 12, 13, 14] {
            store.save(&stored_order(5, day(d), 0), 0).await.unwrap();
        }

        let found = store.find_by_delivery_window(day(10), day(13)).await.unwrap();
        let mut dates: Vec<_> = found.iter().map(|o| o.delivery_date).collect();
        dates.sort();

        assert_eq!(dates, vec![day(10), day(12), day(13)]);
    }

    #[tokio::test]
    async fn test_delete_and_delete_all() {
        let store = InMemoryOrderStore::new();
        let first = stored_order(5, day(10), 0);
        store.save(&first, 0).await.unwrap();
        store.save(&stored_order(5, day(11), 0), 0).await.unwrap();

        assert!(store.delete(first.id).await.unwrap());
        assert!(!store.delete(first.id).await.unwrap());
        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert_eq!(store.count_all().await.unwrap(), 0);
    }

    #[test]
    fn test_only_conflicts_are_transient() {
        use crate::utils::IsTransient;

        let conflict = StoreError::VersionConflict {
            id: Uuid::new_v4(),
            expected: 1,
        };
        assert!(conflict.is_transient());
        assert!(!StoreError::backend("connection refused").is_transient());
    }
}
