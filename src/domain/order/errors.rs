use rust_decimal::Decimal;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Confirmed quantity too high: requested {requested}, maximum {max_allowed}")]
    Overconfirmation {
        requested: Decimal,
        max_allowed: Decimal,
    },

    #[error("{field} must be positive: {value}")]
    InvalidQuantity { field: &'static str, value: Decimal },

    #[error("{field} cannot be negative: {value}")]
    NegativeQuantity { field: &'static str, value: Decimal },

    #[error("Field {0} is required")]
    MissingField(&'static str),

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl OrderError {
    /// Name of the offending field, for validation responses.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            OrderError::Overconfirmation { .. } => Some("quantity"),
            OrderError::InvalidQuantity { field, .. }
            | OrderError::NegativeQuantity { field, .. }
            | OrderError::MissingField(field) => Some(*field),
            OrderError::NotInitialized => None,
        }
    }
}
