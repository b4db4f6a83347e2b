use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::core::Aggregate;
use super::commands::{NewOrder, OrderCommand, OrderEdit};
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{Confirmation, OrderDetails, Unit, DEFAULT_CLIENT_ID};

// ============================================================================
// Order Aggregate - Confirmation Ledger
// ============================================================================
//
// The ledger is append-only: confirmations are pushed, never edited or
// removed. `remaining_to_deliver` is a cached copy of
// ordered_quantity - total_confirmed, rewritten on every append; decisions
// are always taken on the ledger itself.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Commitment
    ordered_quantity: Decimal,
    pub unit: Unit,
    pub delivery_date: NaiveDate,
    pub creation_date: NaiveDate,

    // Ledger
    confirmations: Vec<Confirmation>,
    remaining_to_deliver: Decimal,

    // Carried through
    pub details: OrderDetails,
    pub shipped_quantity: Decimal,
    pub in_preparation_quantity: Decimal,
}

impl OrderAggregate {
    /// Validate a new order and build it, together with the events that
    /// describe its creation. The result has version 0 (not yet persisted).
    pub fn create(
        id: Uuid,
        order: &NewOrder,
        today: NaiveDate,
    ) -> Result<(Self, Vec<OrderEvent>), OrderError> {
        let technology = required(&order.technology, "technology")?;
        let client_name = required(&order.client_name, "client_name")?;

        if order.ordered_quantity <= Decimal::ZERO {
            return Err(OrderError::InvalidQuantity {
                field: "ordered_quantity",
                value: order.ordered_quantity,
            });
        }
        non_negative(order.shipped_quantity, "shipped_quantity")?;
        non_negative(order.in_preparation_quantity, "in_preparation_quantity")?;

        let creation_date = order.creation_date.unwrap_or(today);
        let client_id = order
            .client_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CLIENT_ID)
            .to_string();

        let mut events = vec![OrderEvent::Created(OrderCreated {
            ordered_quantity: order.ordered_quantity,
            unit: order.unit,
            delivery_date: order.delivery_date,
            creation_date,
            details: OrderDetails {
                technology,
                product_family: order.product_family,
                coverage_group: order.coverage_group,
                order_type: order.order_type,
                client_id,
                client_name,
            },
            shipped_quantity: order.shipped_quantity,
            in_preparation_quantity: order.in_preparation_quantity,
        })];

        if order.confirm_in_full {
            events.push(OrderEvent::ConfirmationRecorded(ConfirmationRecorded {
                confirmation: Confirmation {
                    quantity: order.ordered_quantity,
                    date: creation_date,
                },
            }));
        }

        let mut aggregate = Self::apply_first_event(id, &events[0])?;
        for event in events.iter().skip(1) {
            aggregate.apply_event(event)?;
        }

        Ok((aggregate, events))
    }

    pub fn ordered_quantity(&self) -> Decimal {
        self.ordered_quantity
    }

    /// Ledger entries in the order they were recorded.
    pub fn confirmations(&self) -> &[Confirmation] {
        &self.confirmations
    }

    pub fn total_confirmed(&self) -> Decimal {
        self.confirmations.iter().map(|c| c.quantity).sum()
    }

    pub fn is_fully_confirmed(&self) -> bool {
        self.total_confirmed() >= self.ordered_quantity
    }

    /// Loose notion used by listings and KPIs: at least one ledger entry.
    pub fn has_confirmations(&self) -> bool {
        !self.confirmations.is_empty()
    }

    /// Most recent confirmation date, regardless of entry order.
    pub fn latest_confirmation_date(&self) -> Option<NaiveDate> {
        self.confirmations.iter().map(|c| c.date).max()
    }

    /// Quantity still open for confirmation, computed from the ledger.
    pub fn remaining_quantity(&self) -> Decimal {
        (self.ordered_quantity - self.total_confirmed()).max(Decimal::ZERO)
    }

    /// Stored convenience copy of the remaining quantity.
    pub fn remaining_to_deliver(&self) -> Decimal {
        self.remaining_to_deliver
    }

    /// Append one confirmation, keeping the cached remainder in step.
    ///
    /// The ledger is left untouched when this returns an error.
    pub fn append_confirmation(&mut self, quantity: Decimal, date: NaiveDate) -> Result<(), OrderError> {
        self.check_confirmation(quantity)?;

        self.confirmations.push(Confirmation { quantity, date });
        self.remaining_to_deliver = self.ordered_quantity - self.total_confirmed();
        Ok(())
    }

    fn check_confirmation(&self, quantity: Decimal) -> Result<(), OrderError> {
        if quantity <= Decimal::ZERO {
            return Err(OrderError::InvalidQuantity {
                field: "quantity",
                value: quantity,
            });
        }

        let remaining = self.remaining_quantity();
        if quantity > remaining {
            return Err(OrderError::Overconfirmation {
                requested: quantity,
                max_allowed: remaining,
            });
        }

        Ok(())
    }

    fn edited_details(&self, edit: &OrderEdit) -> Result<Option<OrderDetails>, OrderError> {
        let touched = edit.technology.is_some()
            || edit.product_family.is_some()
            || edit.coverage_group.is_some()
            || edit.order_type.is_some()
            || edit.client_id.is_some()
            || edit.client_name.is_some();
        if !touched {
            return Ok(None);
        }

        let mut details = self.details.clone();
        if let Some(ref technology) = edit.technology {
            details.technology = required(technology, "technology")?;
        }
        if let Some(ref client_name) = edit.client_name {
            details.client_name = required(client_name, "client_name")?;
        }
        if let Some(ref client_id) = edit.client_id {
            details.client_id = required(client_id, "client_id")?;
        }
        if let Some(family) = edit.product_family {
            details.product_family = family;
        }
        if let Some(group) = edit.coverage_group {
            details.coverage_group = group;
        }
        if let Some(order_type) = edit.order_type {
            details.order_type = order_type;
        }

        Ok(Some(details))
    }
}

fn required(value: &str, field: &'static str) -> Result<String, OrderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrderError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn non_negative(value: Decimal, field: &'static str) -> Result<(), OrderError> {
    if value < Decimal::ZERO {
        return Err(OrderError::NegativeQuantity { field, value });
    }
    Ok(())
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Created(e) => Ok(Self {
                id: aggregate_id,
                version: 0,
                ordered_quantity: e.ordered_quantity,
                unit: e.unit,
                delivery_date: e.delivery_date,
                creation_date: e.creation_date,
                confirmations: Vec::new(),
                remaining_to_deliver: e.ordered_quantity,
                details: e.details.clone(),
                shipped_quantity: e.shipped_quantity,
                in_preparation_quantity: e.in_preparation_quantity,
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Created(_) => {
                // First event already applied
                Ok(())
            }
            OrderEvent::ConfirmationRecorded(e) => {
                self.append_confirmation(e.confirmation.quantity, e.confirmation.date)
            }
            OrderEvent::DetailsEdited(e) => {
                if let Some(date) = e.delivery_date {
                    self.delivery_date = date;
                }
                if let Some(unit) = e.unit {
                    self.unit = unit;
                }
                if let Some(ref details) = e.details {
                    self.details = details.clone();
                }
                if let Some(shipped) = e.shipped_quantity {
                    self.shipped_quantity = shipped;
                }
                if let Some(in_preparation) = e.in_preparation_quantity {
                    self.in_preparation_quantity = in_preparation;
                }
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::RecordConfirmation { quantity, date } => {
                self.check_confirmation(*quantity)?;

                Ok(vec![OrderEvent::ConfirmationRecorded(ConfirmationRecorded {
                    confirmation: Confirmation {
                        quantity: *quantity,
                        date: *date,
                    },
                })])
            }

            OrderCommand::EditDetails(edit) => {
                if let Some(shipped) = edit.shipped_quantity {
                    non_negative(shipped, "shipped_quantity")?;
                }
                if let Some(in_preparation) = edit.in_preparation_quantity {
                    non_negative(in_preparation, "in_preparation_quantity")?;
                }

                Ok(vec![OrderEvent::DetailsEdited(OrderDetailsEdited {
                    delivery_date: edit.delivery_date,
                    unit: edit.unit,
                    details: self.edited_details(edit)?,
                    shipped_quantity: edit.shipped_quantity,
                    in_preparation_quantity: edit.in_preparation_quantity,
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures::{day, new_order, qty};
    use proptest::prelude::*;

    fn create(ordered: i64) -> OrderAggregate {
        OrderAggregate::create(Uuid::new_v4(), &new_order(ordered), day(1))
            .unwrap()
            .0
    }

    #[test]
    fn test_order_creation() {
        let id = Uuid::new_v4();
        let (order, events) = OrderAggregate::create(id, &new_order(10), day(1)).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(order.id, id);
        assert_eq!(order.version, 0);
        assert_eq!(order.ordered_quantity(), qty(10));
        assert_eq!(order.remaining_to_deliver(), qty(10));
        assert_eq!(order.creation_date, day(1));
        assert_eq!(order.details.client_id, DEFAULT_CLIENT_ID);
        assert!(order.confirmations().is_empty());
        assert!(!order.is_fully_confirmed());
        assert_eq!(order.latest_confirmation_date(), None);
    }

    #[test]
    fn test_creation_confirmed_in_full() {
        let mut request = new_order(10);
        request.confirm_in_full = true;

        let (order, events) = OrderAggregate::create(Uuid::new_v4(), &request, day(2)).unwrap();

        assert_eq!(events.len(), 2);
        assert!(order.is_fully_confirmed());
        assert_eq!(order.remaining_to_deliver(), Decimal::ZERO);
        assert_eq!(order.latest_confirmation_date(), Some(day(2)));
    }

    #[test]
    fn test_creation_validation() {
        let mut request = new_order(0);
        let err = OrderAggregate::create(Uuid::new_v4(), &request, day(1)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity { field: "ordered_quantity", .. }));

        request = new_order(5);
        request.client_name = "   ".to_string();
        let err = OrderAggregate::create(Uuid::new_v4(), &request, day(1)).unwrap_err();
        assert_eq!(err, OrderError::MissingField("client_name"));

        request = new_order(5);
        request.technology = String::new();
        let err = OrderAggregate::create(Uuid::new_v4(), &request, day(1)).unwrap_err();
        assert_eq!(err.field(), Some("technology"));

        request = new_order(5);
        request.shipped_quantity = qty(-1);
        let err = OrderAggregate::create(Uuid::new_v4(), &request, day(1)).unwrap_err();
        assert!(matches!(err, OrderError::NegativeQuantity { field: "shipped_quantity", .. }));
    }

    #[test]
    fn test_partial_then_full_confirmation() {
        let mut order = create(10);

        order.append_confirmation(qty(4), day(1)).unwrap();
        assert_eq!(order.remaining_to_deliver(), qty(6));
        assert!(!order.is_fully_confirmed());

        order.append_confirmation(qty(6), day(2)).unwrap();
        assert_eq!(order.remaining_to_deliver(), Decimal::ZERO);
        assert!(order.is_fully_confirmed());

        let before = order.clone();
        let err = order.append_confirmation(qty(1), day(3)).unwrap_err();
        assert_eq!(
            err,
            OrderError::Overconfirmation {
                requested: qty(1),
                max_allowed: Decimal::ZERO,
            }
        );
        assert_eq!(order, before);
    }

    #[test]
    fn test_overconfirmation_reports_maximum() {
        let mut order = create(10);
        order.append_confirmation(qty(7), day(1)).unwrap();

        let err = order.append_confirmation(qty(5), day(2)).unwrap_err();
        assert!(matches!(
            err,
            OrderError::Overconfirmation { max_allowed, .. } if max_allowed == qty(3)
        ));
        assert_eq!(order.confirmations().len(), 1);
        assert_eq!(order.remaining_to_deliver(), qty(3));
    }

    #[test]
    fn test_non_positive_confirmation_rejected() {
        let mut order = create(10);
        assert!(matches!(
            order.append_confirmation(Decimal::ZERO, day(1)),
            Err(OrderError::InvalidQuantity { field: "quantity", .. })
        ));
        assert!(order.append_confirmation(qty(-2), day(1)).is_err());
        assert!(order.confirmations().is_empty());
    }

    #[test]
    fn test_fractional_quantities() {
        let mut order = create(2);
        order.unit = Unit::Kilogram;

        order.append_confirmation(Decimal::new(125, 2), day(1)).unwrap();
        order.append_confirmation(Decimal::new(75, 2), day(2)).unwrap();

        assert!(order.is_fully_confirmed());
        assert_eq!(order.remaining_to_deliver(), Decimal::ZERO);
    }

    #[test]
    fn test_latest_confirmation_date_ignores_entry_order() {
        let mut order = create(10);
        order.append_confirmation(qty(2), day(9)).unwrap();
        order.append_confirmation(qty(2), day(3)).unwrap();

        assert_eq!(order.latest_confirmation_date(), Some(day(9)));
        // Entry order is preserved
        assert_eq!(order.confirmations()[1].date, day(3));
    }

    #[test]
    fn test_record_confirmation_command() {
        let order = create(10);

        let (next, events) = order
            .execute(&OrderCommand::RecordConfirmation {
                quantity: qty(4),
                date: day(5),
            })
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OrderEvent::ConfirmationRecorded(_)));
        assert_eq!(next.total_confirmed(), qty(4));
        // Source aggregate untouched
        assert!(order.confirmations().is_empty());
    }

    #[test]
    fn test_rejected_command_emits_nothing() {
        let order = create(3);

        let result = order.handle_command(&OrderCommand::RecordConfirmation {
            quantity: qty(4),
            date: day(5),
        });

        assert!(matches!(result, Err(OrderError::Overconfirmation { .. })));
    }

    #[test]
    fn test_edit_details_leaves_ledger_alone() {
        let mut order = create(10);
        order.append_confirmation(qty(4), day(1)).unwrap();

        let edit = OrderEdit {
            delivery_date: Some(day(28)),
            client_name: Some("  NEW CLIENT ".to_string()),
            unit: Some(Unit::Meter),
            ..Default::default()
        };

        let (next, _) = order.execute(&OrderCommand::EditDetails(edit)).unwrap();

        assert_eq!(next.delivery_date, day(28));
        assert_eq!(next.unit, Unit::Meter);
        assert_eq!(next.details.client_name, "NEW CLIENT");
        assert_eq!(next.details.technology, "TON111");
        assert_eq!(next.confirmations(), order.confirmations());
        assert_eq!(next.ordered_quantity(), qty(10));
        assert_eq!(next.remaining_to_deliver(), qty(6));
    }

    #[test]
    fn test_edit_validation() {
        let order = create(10);

        let blank = OrderEdit {
            technology: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            order.handle_command(&OrderCommand::EditDetails(blank)).unwrap_err(),
            OrderError::MissingField("technology")
        );

        let negative = OrderEdit {
            in_preparation_quantity: Some(qty(-3)),
            ..Default::default()
        };
        assert!(order.handle_command(&OrderCommand::EditDetails(negative)).is_err());
    }

    #[test]
    fn test_first_event_must_be_created() {
        let event = OrderEvent::ConfirmationRecorded(ConfirmationRecorded {
            confirmation: Confirmation {
                quantity: qty(1),
                date: day(1),
            },
        });

        let result = OrderAggregate::apply_first_event(Uuid::new_v4(), &event);
        assert_eq!(result.unwrap_err(), OrderError::NotInitialized);
    }

    #[test]
    fn test_order_document_roundtrip() {
        let mut order = create(10);
        order.append_confirmation(qty(4), day(1)).unwrap();

        let json = serde_json::to_string(&order).unwrap();
        let restored: OrderAggregate = serde_json::from_str(&json).unwrap();

        assert_eq!(order, restored);
        assert_eq!(restored.total_confirmed(), qty(4));
    }

    proptest! {
        #[test]
        fn prop_ledger_never_exceeds_ordered(
            ordered in 1i64..500,
            attempts in prop::collection::vec(1i64..200, 0..30),
        ) {
            let mut order = create(ordered);
            let mut was_full = false;

            for (i, attempt) in attempts.into_iter().enumerate() {
                let before = order.clone();
                let remaining = order.remaining_quantity();

                match order.append_confirmation(qty(attempt), day((i % 28) as u32 + 1)) {
                    Ok(()) => prop_assert!(qty(attempt) <= remaining),
                    Err(OrderError::Overconfirmation { max_allowed, .. }) => {
                        prop_assert!(qty(attempt) > remaining);
                        prop_assert_eq!(max_allowed, remaining);
                        prop_assert_eq!(&order, &before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                }

                prop_assert!(order.total_confirmed() <= order.ordered_quantity());
                prop_assert_eq!(
                    order.remaining_to_deliver(),
                    order.ordered_quantity() - order.total_confirmed()
                );

                // Once full, stays full
                if was_full {
                    prop_assert!(order.is_fully_confirmed());
                }
                prop_assert_eq!(
                    order.is_fully_confirmed(),
                    order.total_confirmed() >= order.ordered_quantity()
                );
                was_full = order.is_fully_confirmed();
            }
        }
    }
}
