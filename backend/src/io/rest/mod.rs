//! # REST API Interface Layer
//!
//! HTTP endpoints for the cleaning scheduler, mounted under `/api`.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: one module per resource, each exposing a `router()`
//! - **Error Handling**: [`ApiError`] maps domain failures to status codes
//!   with a uniform JSON body
//! - **Logging**: every handler logs its route on entry and failures on exit
//!
//! ## Error body
//!
//! ```json
//! { "error": "validation", "message": "invalid date: ...", "field": "date" }
//! ```
//!
//! | Domain error | Status |
//! |--------------|--------|
//! | Validation   | 400    |
//! | NotFound     | 404    |
//! | Storage      | 500    |

pub mod client_apis;
pub mod recurring_apis;
pub mod schedule_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::domain::DomainError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

/// A domain failure on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            DomainError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
        };
        let body = ErrorBody {
            error: kind,
            message: self.0.to_string(),
            field: self.0.field().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
