//! API error types with HTTP response mapping.

use allocation::AllocationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use serde_json::json;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Allocation pipeline error.
    Allocation(AllocationError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Allocation(err) => allocation_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// An exhausted candidate list carries the per-vendor failure reasons so
/// callers can tell a stock shortage from a vendor outage.
fn allocation_error_to_response(err: AllocationError) -> (StatusCode, serde_json::Value) {
    match &err {
        AllocationError::AllCandidatesFailed { failures, .. } => {
            let reasons: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
            (
                StatusCode::CONFLICT,
                json!({ "error": err.to_string(), "reasons": reasons }),
            )
        }
        AllocationError::NoCandidates(_) | AllocationError::AllocationInProgress { .. } => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        AllocationError::CatalogUnavailable(_)
        | AllocationError::Inventory(_)
        | AllocationError::Cancelled { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": err.to_string() }))
        }
        AllocationError::ReservationNotFound(_) => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        AllocationError::Domain(DomainError::InvalidTransition { .. }) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        AllocationError::Domain(_) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
        AllocationError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": err.to_string() }))
        }
    }
}

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        ApiError::Allocation(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Allocation(AllocationError::Domain(err))
    }
}
