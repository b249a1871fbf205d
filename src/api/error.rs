//! Translation of pipeline errors into HTTP responses.

use crate::domain::PriceError;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description
    #[schema(example = "Currency not supported")]
    pub message: String,
    /// HTTP status name
    #[schema(example = "BAD_REQUEST")]
    pub status: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status_name(status),
        }
    }
}

/// "Too Many Requests" -> "TOO_MANY_REQUESTS"
fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
        .replace(' ', "_")
}

pub fn status_for(error: &PriceError) -> StatusCode {
    match error {
        PriceError::UnsupportedCurrency { .. }
        | PriceError::InvalidDate { .. }
        | PriceError::SourceMissing { .. }
        | PriceError::SourceParseError { .. }
        | PriceError::NoRecordForDate { .. } => StatusCode::BAD_REQUEST,
        PriceError::EmptySeries | PriceError::DivisionByZero(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn price_error_response(error: PriceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&error);
    metrics::counter!("price_api_errors_total", "kind" => error.kind()).increment(1);
    tracing::info!(kind = error.kind(), "Request failed: {}", error);
    (status, Json(ErrorResponse::new(status, error.to_string())))
}
