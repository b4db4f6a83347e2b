use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::value_objects::{CoverageGroup, OrderType, ProductFamily, Unit};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Everything needed to open a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub technology: String,
    pub product_family: ProductFamily,
    pub coverage_group: CoverageGroup,
    pub order_type: OrderType,
    pub client_id: Option<String>,
    pub client_name: String,
    pub ordered_quantity: Decimal,
    pub unit: Unit,
    pub delivery_date: NaiveDate,
    /// Defaults to today when absent.
    pub creation_date: Option<NaiveDate>,
    pub shipped_quantity: Decimal,
    pub in_preparation_quantity: Decimal,
    /// Record a single confirmation for the whole quantity right away.
    pub confirm_in_full: bool,
}

/// Partial administrative edit. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct OrderEdit {
    pub technology: Option<String>,
    pub product_family: Option<ProductFamily>,
    pub coverage_group: Option<CoverageGroup>,
    pub order_type: Option<OrderType>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub unit: Option<Unit>,
    pub delivery_date: Option<NaiveDate>,
    pub shipped_quantity: Option<Decimal>,
    pub in_preparation_quantity: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub enum OrderCommand {
    RecordConfirmation {
        quantity: Decimal,
        date: NaiveDate,
    },
    EditDetails(OrderEdit),
}
