//! HTTP error mapping.
//!
//! `NotFound` becomes 404, bad input becomes 400, everything else becomes a
//! logged 500 with a generic body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::{EntityKind, StoreError, ValidationError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: i64 },
    #[error(transparent)]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(_) | Self::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": self.to_string()
                }),
            ),
            Self::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": self.to_string()
                }),
            ),
            Self::Store(_) | Self::Internal(_) => {
                error!("event=http_error module=api status=error error={}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use catalog_core::{EntityKind, StoreError, ValidationError};

    #[test]
    fn not_found_store_error_is_404() {
        let err = ApiError::from(StoreError::NotFound {
            entity: EntityKind::Product,
            id: 3,
        });
        assert_eq!(err.to_string(), "product not found: 3");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_error_is_400() {
        let err = ApiError::from(ValidationError::Blank { field: "name" });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_store_errors_are_500() {
        let err = ApiError::from(StoreError::InvalidTransaction("transaction is no longer active"));
        assert!(matches!(err, ApiError::Store(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
