use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Order Value Objects
// ============================================================================

/// One partial confirmation recorded against an order.
///
/// `date` is supplied by whoever records the confirmation; it is not
/// necessarily the day it was entered.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Confirmation {
    pub quantity: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "PCE")]
    Piece,
    #[serde(rename = "KG")]
    Kilogram,
    #[serde(rename = "L")]
    Liter,
    #[serde(rename = "M")]
    Meter,
}

impl Unit {
    pub fn code(&self) -> &'static str {
        match self {
            Unit::Piece => "PCE",
            Unit::Kilogram => "KG",
            Unit::Liter => "L",
            Unit::Meter => "M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductFamily {
    #[default]
    #[serde(rename = "APS BulkNiv2")]
    BulkNiv2,
    #[serde(rename = "APS Finished Product")]
    FinishedProduct,
    #[serde(rename = "APS Laser Box")]
    LaserBox,
    #[serde(rename = "APS Packaging Label")]
    PackagingLabel,
    #[serde(rename = "APS Copier Box")]
    CopierBox,
    #[serde(rename = "APS Cartridge Label")]
    CartridgeLabel,
    #[serde(rename = "APS Airbag/Insert/Inlay")]
    AirbagInsertInlay,
    #[serde(rename = "APS Packaging Other")]
    PackagingOther,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoverageGroup {
    #[default]
    #[serde(rename = "PF")]
    Pf,
    #[serde(rename = "OF")]
    Of,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    #[serde(rename = "ZIG")]
    Zig,
    #[serde(rename = "STD")]
    Std,
}

/// Client used when a request does not name one.
pub const DEFAULT_CLIENT_ID: &str = "32290";

/// Identity and classification fields. Carried through unchanged; nothing in
/// the confirmation or scanning logic looks at them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDetails {
    /// Article identifier used for reporting.
    pub technology: String,
    pub product_family: ProductFamily,
    pub coverage_group: CoverageGroup,
    pub order_type: OrderType,
    pub client_id: String,
    pub client_name: String,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_wire_codes() {
        let json = serde_json::to_string(&Unit::Kilogram).unwrap();
        assert_eq!(json, "\"KG\"");

        let unit: Unit = serde_json::from_str("\"M\"").unwrap();
        assert_eq!(unit, Unit::Meter);
        assert_eq!(unit.code(), "M");
    }

    #[test]
    fn test_classification_defaults() {
        assert_eq!(Unit::default(), Unit::Piece);
        assert_eq!(CoverageGroup::default(), CoverageGroup::Pf);
        assert_eq!(OrderType::default(), OrderType::Zig);
        assert_eq!(
            serde_json::to_string(&ProductFamily::default()).unwrap(),
            "\"APS BulkNiv2\""
        );
    }

    #[test]
    fn test_unknown_product_family_rejected() {
        let result: Result<ProductFamily, _> = serde_json::from_str("\"APS Bogus\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_confirmation_serialization() {
        let confirmation = Confirmation {
            quantity: Decimal::from(4),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };

        let json = serde_json::to_string(&confirmation).unwrap();
        assert!(json.contains("2024-03-01"));

        let deserialized: Confirmation = serde_json::from_str(&json).unwrap();
        assert_eq!(confirmation, deserialized);
    }
}
