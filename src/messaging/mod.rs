mod redpanda;

pub use redpanda::{RedpandaClient, RedpandaReminderDispatcher};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{OrderAggregate, Unit};

// ============================================================================
// Reminder Dispatch
// ============================================================================
//
// The delivery-risk scanner hands every at-risk order to a dispatcher. Sinks:
// - RedpandaReminderDispatcher: JSON message on a topic, keyed by order id
// - LoggingReminderDispatcher:  writes the reminder to the log only
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Reminder sink unavailable (circuit open)")]
    CircuitOpen,

    #[error("Failed to publish reminder: {0}")]
    Publish(String),

    #[error("Failed to encode reminder: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DispatchError {
    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::CircuitOpen => "circuit_open",
            DispatchError::Publish(_) => "publish_failed",
            DispatchError::Encode(_) => "encode_failed",
        }
    }
}

#[async_trait]
pub trait ReminderDispatcher: Send + Sync {
    async fn send_reminder(&self, order: &OrderAggregate) -> Result<(), DispatchError>;
}

/// What goes out for one order that is close to delivery and still short
/// on confirmations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub order_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub client_name: String,
    pub technology: String,
    pub delivery_date: NaiveDate,
    pub ordered_quantity: Decimal,
    pub confirmed_quantity: Decimal,
    pub unit: Unit,
    pub subject: String,
    pub body: String,
}

impl ReminderMessage {
    pub const SUBJECT: &'static str = "Order confirmation reminder";

    pub fn for_order(order: &OrderAggregate, recipient: Option<String>) -> Self {
        let unit = order.unit.code();
        let confirmed = order.total_confirmed();

        let body = format!(
            "Hello,\n\n\
             Your order due for delivery on {} is still not fully confirmed.\n\n\
             Ordered quantity: {} {}\n\
             Confirmed quantity: {} {}\n\n\
             Please get in touch with us quickly to validate the delivery.\n\n\
             Regards,\nThe team\n",
            order.delivery_date.format("%d/%m/%Y"),
            order.ordered_quantity(),
            unit,
            confirmed,
            unit,
        );

        Self {
            order_id: order.id,
            recipient,
            client_name: order.details.client_name.clone(),
            technology: order.details.technology.clone(),
            delivery_date: order.delivery_date,
            ordered_quantity: order.ordered_quantity(),
            confirmed_quantity: confirmed,
            unit: order.unit,
            subject: Self::SUBJECT.to_string(),
            body,
        }
    }
}

/// Sink for local runs: the reminder ends up in the log.
#[derive(Debug, Default)]
pub struct LoggingReminderDispatcher {
    recipient: Option<String>,
}

impl LoggingReminderDispatcher {
    pub fn new(recipient: Option<String>) -> Self {
        Self { recipient }
    }
}

#[async_trait]
impl ReminderDispatcher for LoggingReminderDispatcher {
    async fn send_reminder(&self, order: &OrderAggregate) -> Result<(), DispatchError> {
        let message = ReminderMessage::for_order(order, self.recipient.clone());

        tracing::info!(
            order_id = %message.order_id,
            client = %message.client_name,
            delivery_date = %message.delivery_date,
            ordered = %message.ordered_quantity,
            confirmed = %message.confirmed_quantity,
            recipient = ?message.recipient,
            "📧 Reminder: {}",
            message.subject
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures::{day, qty, stored_order};

    #[test]
    fn test_reminder_message_carries_order_figures() {
        let order = stored_order(10, day(20), 4);

        let message = ReminderMessage::for_order(&order, Some("planning@example.com".into()));

        assert_eq!(message.order_id, order.id);
        assert_eq!(message.ordered_quantity, qty(10));
        assert_eq!(message.confirmed_quantity, qty(4));
        assert_eq!(message.subject, ReminderMessage::SUBJECT);
        assert!(message.body.contains("20/06/2024"));
        assert!(message.body.contains("Ordered quantity: 10 PCE"));
        assert!(message.body.contains("Confirmed quantity: 4 PCE"));
    }

    #[test]
    fn test_recipient_omitted_when_absent() {
        let order = stored_order(10, day(20), 0);
        let json = serde_json::to_value(ReminderMessage::for_order(&order, None)).unwrap();

        assert!(json.get("recipient").is_none());
        assert_eq!(json["unit"], "PCE");
    }

    #[tokio::test]
    async fn test_logging_dispatcher_always_succeeds() {
        let dispatcher = LoggingReminderDispatcher::new(None);
        let order = stored_order(3, day(5), 1);

        assert!(dispatcher.send_reminder(&order).await.is_ok());
    }

    #[test]
    fn test_dispatch_error_reasons() {
        assert_eq!(DispatchError::CircuitOpen.reason(), "circuit_open");
        assert_eq!(DispatchError::Publish("timeout".into()).reason(), "publish_failed");
    }
}
