//! HTTP mapping for engine errors.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use marquee_core::BookingError;
use serde::Serialize;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A `BookingError` carried to the HTTP boundary.
///
/// Handlers return this via `?`; the status code comes from the error kind
/// so the taxonomy stays intact across the wire.
pub struct ApiError(BookingError);

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BookingError::Validation(_) | BookingError::InvalidAction(_) => {
                StatusCode::BAD_REQUEST
            }
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Conflict(_) | BookingError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::Authorization(_) => StatusCode::FORBIDDEN,
            BookingError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BookingError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
