use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::core::{Aggregate, DomainEvent};
use crate::metrics::Metrics;
use crate::store::{OrderStore, StoreError};
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::OrderAggregate;
use super::commands::{NewOrder, OrderCommand, OrderEdit};
use super::errors::OrderError;
use super::query::{sort_newest_first, OrderPage, OrderQuery};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Load → Command → Aggregate → Save (compare-and-set)
//
// Every change is a read-validate-write cycle against the version that was
// read. A lost race surfaces as StoreError::VersionConflict and the whole
// cycle is run again on fresh state, so two confirmations racing for the
// same remainder can never both pass validation.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Domain(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IsTransient for OrderServiceError {
    fn is_transient(&self) -> bool {
        match self {
            OrderServiceError::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub struct OrderCommandHandler {
    store: Arc<dyn OrderStore>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
}

impl OrderCommandHandler {
    pub fn new(store: Arc<dyn OrderStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            metrics,
            retry: RetryConfig::for_conflicts(),
        }
    }

    pub async fn create(&self, request: NewOrder) -> Result<OrderAggregate, OrderServiceError> {
        let today = Utc::now().date_naive();
        let (mut order, events) = OrderAggregate::create(Uuid::now_v7(), &request, today)?;

        order.version = 1;
        self.store.save(&order, 0).await?;

        tracing::info!(
            order_id = %order.id,
            technology = %order.details.technology,
            client = %order.details.client_name,
            ordered = %order.ordered_quantity(),
            events = ?events.iter().map(|e| e.event_type()).collect::<Vec<_>>(),
            "📦 Order created"
        );

        Ok(order)
    }

    /// Append one confirmation to the order's ledger.
    pub async fn confirm(
        &self,
        id: Uuid,
        quantity: Decimal,
        date: NaiveDate,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let result = self
            .execute(id, OrderCommand::RecordConfirmation { quantity, date })
            .await;

        match &result {
            Ok(order) => {
                self.metrics.record_confirmation();
                tracing::info!(
                    order_id = %id,
                    quantity = %quantity,
                    date = %date,
                    remaining = %order.remaining_to_deliver(),
                    fully_confirmed = order.is_fully_confirmed(),
                    "✅ Confirmation recorded"
                );
            }
            Err(OrderServiceError::Domain(OrderError::Overconfirmation { max_allowed, .. })) => {
                self.metrics.record_confirmation_rejected("overconfirmation");
                tracing::warn!(
                    order_id = %id,
                    quantity = %quantity,
                    max_allowed = %max_allowed,
                    "Confirmation exceeds remaining quantity"
                );
            }
            Err(OrderServiceError::Domain(_)) => {
                self.metrics.record_confirmation_rejected("invalid");
            }
            Err(_) => {}
        }

        result
    }

    pub async fn edit(&self, id: Uuid, edit: OrderEdit) -> Result<OrderAggregate, OrderServiceError> {
        let order = self.execute(id, OrderCommand::EditDetails(edit)).await?;

        tracing::info!(order_id = %id, version = order.version, "✏️ Order edited");
        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), OrderServiceError> {
        if !self.store.delete(id).await? {
            return Err(OrderServiceError::NotFound(id));
        }

        tracing::info!(order_id = %id, "🗑️ Order deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<OrderAggregate, OrderServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(OrderServiceError::NotFound(id))
    }

    /// Every stored order, newest first, for reporting. Ranking ties are
    /// broken by position, so the order must not depend on the store.
    pub async fn snapshot(&self) -> Result<Vec<OrderAggregate>, OrderServiceError> {
        let mut orders = self.store.find_all().await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<OrderPage, OrderServiceError> {
        let orders = self.store.find_all().await?;
        Ok(query.apply(orders))
    }

    /// Run `command` against the stored order, retrying the full cycle on
    /// version conflicts.
    async fn execute(
        &self,
        id: Uuid,
        command: OrderCommand,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let command = &command;

        retry_on_transient(self.retry.clone(), move |attempt| {
            self.try_execute(id, command, attempt)
        })
        .await
        .into_result()
    }

    async fn try_execute(
        &self,
        id: Uuid,
        command: &OrderCommand,
        attempt: u32,
    ) -> Result<OrderAggregate, OrderServiceError> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrderServiceError::NotFound(id))?;

        let (mut next, events) = current.execute(command)?;
        next.version = current.version() + 1;

        match self.store.save(&next, current.version()).await {
            Ok(()) => {
                tracing::debug!(
                    order_id = %id,
                    version = next.version,
                    attempt = attempt,
                    events = ?events.iter().map(|e| e.event_type()).collect::<Vec<_>>(),
                    "Order saved"
                );
                Ok(next)
            }
            Err(e @ StoreError::VersionConflict { .. }) => {
                self.metrics.record_version_conflict();
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
