use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{CoverageGroup, NewOrder, OrderAggregate, OrderType, ProductFamily, Unit};

// Shared builders for order tests across the crate.

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

pub fn qty(n: i64) -> Decimal {
    Decimal::from(n)
}

pub fn new_order(ordered: i64) -> NewOrder {
    NewOrder {
        technology: "TON111".to_string(),
        product_family: ProductFamily::BulkNiv2,
        coverage_group: CoverageGroup::Pf,
        order_type: OrderType::Zig,
        client_id: None,
        client_name: "ARMOR PRINT SOLUTIONS S.A.S.".to_string(),
        ordered_quantity: qty(ordered),
        unit: Unit::Piece,
        delivery_date: day(20),
        creation_date: None,
        shipped_quantity: Decimal::ZERO,
        in_preparation_quantity: Decimal::ZERO,
        confirm_in_full: false,
    }
}

/// An order as it would come back from the store (version 1).
pub fn stored_order(ordered: i64, delivery_date: NaiveDate, confirmed: i64) -> OrderAggregate {
    let mut request = new_order(ordered);
    request.delivery_date = delivery_date;

    let (mut order, _) = OrderAggregate::create(Uuid::new_v4(), &request, day(1)).unwrap();
    if confirmed > 0 {
        order.append_confirmation(qty(confirmed), day(1)).unwrap();
    }
    order.version = 1;
    order
}
