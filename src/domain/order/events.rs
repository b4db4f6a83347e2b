use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::core::DomainEvent;
use super::value_objects::{Confirmation, OrderDetails, Unit};

// ============================================================================
// Order Events - Facts about an order that have already happened
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created(OrderCreated),
    ConfirmationRecorded(ConfirmationRecorded),
    DetailsEdited(OrderDetailsEdited),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::ConfirmationRecorded(_) => "OrderConfirmationRecorded",
            OrderEvent::DetailsEdited(_) => "OrderDetailsEdited",
        }
    }
}

/// Order Created - Initial event, ledger is empty
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderCreated {
    pub ordered_quantity: Decimal,
    pub unit: Unit,
    pub delivery_date: NaiveDate,
    pub creation_date: NaiveDate,
    pub details: OrderDetails,
    pub shipped_quantity: Decimal,
    pub in_preparation_quantity: Decimal,
}

/// Confirmation Recorded - One entry appended to the ledger
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConfirmationRecorded {
    pub confirmation: Confirmation,
}

/// Order Details Edited - Administrative change, ledger untouched
///
/// Only the `Some` fields change.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct OrderDetailsEdited {
    pub delivery_date: Option<NaiveDate>,
    pub unit: Option<Unit>,
    pub details: Option<OrderDetails>,
    pub shipped_quantity: Option<Decimal>,
    pub in_preparation_quantity: Option<Decimal>,
}
