use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlValue, Row};
use uuid::Uuid;

use crate::domain::order::OrderAggregate;
use super::{OrderStore, StoreError};

// ============================================================================
// ScyllaDB Order Store
// ============================================================================
//
// Table layout:
//   orders (id uuid PRIMARY KEY, version bigint, delivery_date date,
//           creation_date date, document text)
//
// `document` holds the serialized aggregate, ledger included. Every write is
// a lightweight transaction (IF NOT EXISTS / IF version = ?), so a writer
// holding a stale copy of an order cannot overwrite a newer one.
//
// ============================================================================

pub struct ScyllaOrderStore {
    session: Arc<Session>,
}

impl ScyllaOrderStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Open a session, create the keyspace if it is missing and make sure
    /// the orders table exists.
    pub async fn connect(nodes: &[String], keyspace: &str) -> anyhow::Result<Self> {
        tracing::info!(nodes = ?nodes, keyspace = %keyspace, "Connecting to ScyllaDB...");

        let session: Session = SessionBuilder::new().known_nodes(nodes).build().await?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                    keyspace
                ),
                &[],
            )
            .await?;
        session.use_keyspace(keyspace, false).await?;

        let store = Self::new(Arc::new(session));
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS orders (
                    id uuid PRIMARY KEY,
                    version bigint,
                    delivery_date date,
                    creation_date date,
                    document text
                )",
                &[],
            )
            .await?;

        tracing::info!("Orders table ready");
        Ok(())
    }

    fn decode_documents(result: QueryResult) -> Result<Vec<OrderAggregate>, StoreError> {
        let rows_result = require_rows(result.into_rows_result())?;

        let mut orders = Vec::new();
        for row in rows_result.rows::<(String,)>().map_err(StoreError::backend)? {
            let (document,) = row.map_err(StoreError::backend)?;
            orders.push(serde_json::from_str(&document)?);
        }

        Ok(orders)
    }

    /// First column of a lightweight-transaction result is `[applied]`.
    fn was_applied(result: QueryResult) -> Result<bool, StoreError> {
        let rows_result = require_rows(result.into_rows_result())?;
        let row = rows_result
            .maybe_first_row::<Row>()
            .map_err(StoreError::backend)?;

        Ok(matches!(
            row.as_ref().and_then(|r| r.columns.first()),
            Some(Some(CqlValue::Boolean(true)))
        ))
    }
}

/// SELECTs and lightweight transactions always answer with a rows result,
/// empty or not. Anything else means the request went wrong.
fn require_rows<R, E: std::fmt::Display>(result: Result<R, E>) -> Result<R, StoreError> {
    result.map_err(|e| StoreError::backend(format!("unexpected response: {}", e)))
}

#[async_trait]
impl OrderStore for ScyllaOrderStore {
    async fn find_by_delivery_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OrderAggregate>, StoreError> {
        // delivery_date is not part of the key; orders stay a small table
        let result = self
            .session
            .query_unpaged(
                "SELECT document FROM orders WHERE delivery_date >= ? AND delivery_date <= ? ALLOW FILTERING",
                (start, end),
            )
            .await
            .map_err(StoreError::backend)?;

        let orders = Self::decode_documents(result)?;
        tracing::debug!(
            start = %start,
            end = %end,
            count = orders.len(),
            "Loaded orders in delivery window"
        );
        Ok(orders)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderAggregate>, StoreError> {
        let result = self
            .session
            .query_unpaged("SELECT document FROM orders WHERE id = ?", (id,))
            .await
            .map_err(StoreError::backend)?;

        Ok(Self::decode_documents(result)?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<OrderAggregate>, StoreError> {
        let result = self
            .session
            .query_unpaged("SELECT document FROM orders", &[])
            .await
            .map_err(StoreError::backend)?;

        Self::decode_documents(result)
    }

    async fn save(&self, order: &OrderAggregate, expected_version: i64) -> Result<(), StoreError> {
        let document = serde_json::to_string(order)?;

        let result = if expected_version == 0 {
            self.session
                .query_unpaged(
                    "INSERT INTO orders (id, version, delivery_date, creation_date, document)
                     VALUES (?, ?, ?, ?, ?) IF NOT EXISTS",
                    (
                        order.id,
                        order.version,
                        order.delivery_date,
                        order.creation_date,
                        document,
                    ),
                )
                .await
        } else {
            self.session
                .query_unpaged(
                    "UPDATE orders SET version = ?, delivery_date = ?, creation_date = ?, document = ?
                     WHERE id = ? IF version = ?",
                    (
                        order.version,
                        order.delivery_date,
                        order.creation_date,
                        document,
                        order.id,
                        expected_version,
                    ),
                )
                .await
        }
        .map_err(StoreError::backend)?;

        if !Self::was_applied(result)? {
            return Err(StoreError::VersionConflict {
                id: order.id,
                expected: expected_version,
            });
        }

        tracing::info!(
            order_id = %order.id,
            version = order.version,
            "✅ Persisted order document"
        );

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = self
            .session
            .query_unpaged("DELETE FROM orders WHERE id = ? IF EXISTS", (id,))
            .await
            .map_err(StoreError::backend)?;

        Self::was_applied(result)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let removed = self.count_all().await?;

        self.session
            .query_unpaged("TRUNCATE orders", &[])
            .await
            .map_err(StoreError::backend)?;

        tracing::warn!(removed = removed, "Truncated orders table");
        Ok(removed)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        let result = self
            .session
            .query_unpaged("SELECT COUNT(*) FROM orders", &[])
            .await
            .map_err(StoreError::backend)?;

        let rows_result = require_rows(result.into_rows_result())?;

        match rows_result.maybe_first_row::<(i64,)>() {
            Ok(Some((count,))) => Ok(count.max(0) as u64),
            Ok(None) => Ok(0),
            Err(e) => Err(StoreError::backend(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_rows_response_is_an_error() {
        let err = require_rows::<Vec<String>, _>(Err("Result is not of Rows kind")).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Backend(ref msg) if msg.contains("not of Rows kind")
        ));
    }

    #[test]
    fn test_rows_response_passes_through() {
        let rows = require_rows::<_, String>(Ok(Vec::<String>::new())).unwrap();
        assert!(rows.is_empty());
    }
}
