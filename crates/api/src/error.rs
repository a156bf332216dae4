//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;

/// API-level error that maps onto HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request before it reached the engine.
    BadRequest(String),
    /// Engine error, mapped by taxonomy.
    Engine(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(err) => engine_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn engine_error_to_response(err: OrderError) -> (StatusCode, String) {
    let status = match &err {
        OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
        OrderError::Forbidden { .. } => StatusCode::FORBIDDEN,
        OrderError::Conflict { .. } | OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
        OrderError::Expired { .. } => StatusCode::GONE,
        OrderError::Internal(msg) => {
            tracing::error!(error = %msg, "internal server error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Engine(err)
    }
}
