use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i32,
        available: i32,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn product_not_found(product_id: Uuid) -> Self {
        ServiceError::NotFound(format!("Product with ID {} not found", product_id))
    }

    /// Whether the error is a transient storage conflict that the caller
    /// may retry (serialization failures, lock contention).
    pub fn is_transient_conflict(&self) -> bool {
        match self {
            ServiceError::Conflict(_) => true,
            ServiceError::DatabaseError(db_err) => {
                let msg = db_err.to_string().to_ascii_lowercase();
                msg.contains("deadlock")
                    || msg.contains("serialization")
                    || msg.contains("database is locked")
            }
            _ => false,
        }
    }

    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ServiceError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            ServiceError::InsufficientStock { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Unprocessable Entity")
            }
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::DatabaseError(_)
            | ServiceError::EventError(_)
            | ServiceError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();

        // Storage failures are logged with full detail but surfaced
        // generically; everything else carries its own message.
        let message = match &self {
            ServiceError::DatabaseError(db_err) => {
                error!(error = %db_err, "request failed with a storage error");
                "An error occurred while accessing the database. Please try again later.".to_string()
            }
            ServiceError::InternalError(msg) => {
                error!(error = %msg, "request failed with an internal error");
                "An unexpected internal error occurred.".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: label.to_string(),
            message,
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ServiceError::NotFound("Order missing".into());
        let (status, label) = err.status_and_label();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(label, "Not Found");
    }

    #[test]
    fn insufficient_stock_maps_to_422_and_names_the_shortfall() {
        let err = ServiceError::InsufficientStock {
            product: "Espresso Machine".into(),
            requested: 6,
            available: 5,
        };
        assert_eq!(err.status_and_label().0, StatusCode::UNPROCESSABLE_ENTITY);
        let msg = err.to_string();
        assert!(msg.contains("Espresso Machine"));
        assert!(msg.contains("requested 6"));
        assert!(msg.contains("available 5"));
    }

    #[test]
    fn conflict_is_transient_and_maps_to_409() {
        let err = ServiceError::Conflict("rollup lost a race".into());
        assert!(err.is_transient_conflict());
        assert_eq!(err.status_and_label(), (StatusCode::CONFLICT, "Conflict"));
        assert!(!ServiceError::NotFound("x".into()).is_transient_conflict());
    }
}
