//! Error responses.
//!
//! Every failure leaves the API as `{"error": "<code>", "message": "<text>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reimburse_core::approval::ApprovalError;
use reimburse_db::RepositoryError;
use serde_json::json;
use tracing::{error, warn};

/// Builds an error response.
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let message: String = message.into();
    (status, Json(json!({ "error": error, "message": message }))).into_response()
}

/// Maps a repository error, logging server-side failures with their detail.
pub fn repository_error_response(e: &RepositoryError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if e.is_internal() {
        error!(error = %e, "Request failed");
    } else if let RepositoryError::Approval(ApprovalError::ReferenceIntegrity(detail)) = e {
        warn!(detail = %detail, "Reference integrity violation");
    }

    error_response(status, e.error_code(), e.public_message())
}

/// 403 response for a role that may not use the endpoint.
pub fn forbidden(message: &str) -> Response {
    error_response(StatusCode::FORBIDDEN, "FORBIDDEN", message)
}

/// 400 response for malformed input.
pub fn validation_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
}
