use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::actors::ScanError;
use crate::domain::order::{OrderError, OrderServiceError};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] OrderServiceError),

    #[error("Field {field} is required")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl ApiError {
    fn field(&self) -> Option<&'static str> {
        match self {
            ApiError::Service(OrderServiceError::Domain(e)) => e.field(),
            ApiError::MissingField { field } | ApiError::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Service(OrderServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(OrderServiceError::Domain(OrderError::Overconfirmation { .. })) => {
                StatusCode::CONFLICT
            }
            ApiError::Service(OrderServiceError::Domain(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(OrderServiceError::Store(StoreError::VersionConflict { .. })) => {
                StatusCode::CONFLICT
            }
            ApiError::Service(OrderServiceError::Store(StoreError::Backend(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Service(OrderServiceError::Store(StoreError::Serialization(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::MissingField { .. }
            | ApiError::InvalidField { .. }
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Scan(ScanError::Busy) => StatusCode::CONFLICT,
            ApiError::Scan(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let mut body = json!({
            "success": false,
            "message": self.to_string(),
        });
        if let Some(field) = self.field() {
            body["field"] = json!(field);
        }
        if let ApiError::Service(OrderServiceError::Domain(OrderError::Overconfirmation {
            max_allowed,
            ..
        })) = self
        {
            body["maxAllowed"] = json!(max_allowed);
        }

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(OrderServiceError::NotFound(Uuid::new_v4()));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let over = ApiError::from(OrderServiceError::Domain(OrderError::Overconfirmation {
            requested: Decimal::from(5),
            max_allowed: Decimal::from(3),
        }));
        assert_eq!(over.status_code(), StatusCode::CONFLICT);
        assert_eq!(over.field(), Some("quantity"));

        let invalid = ApiError::from(OrderServiceError::Domain(OrderError::MissingField("technology")));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let down = ApiError::from(OrderServiceError::Store(StoreError::backend("timeout")));
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(ApiError::from(ScanError::Busy).status_code(), StatusCode::CONFLICT);
    }
}
