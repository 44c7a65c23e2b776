use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};

use mercora_core::DomainError;

/// Uniform JSON error body: `{"error": code, "message": ...}`.
pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "error": code,
        "message": message.into(),
    });
    (status, Json(body)).into_response()
}

/// Map a domain error onto the HTTP surface.
///
/// | variant              | status |
/// |----------------------|--------|
/// | `Validation`         | 400    |
/// | `InvalidId`          | 400    |
/// | `InvariantViolation` | 422    |
/// | `Unauthorized`       | 403    |
/// | `NotFound`           | 404    |
/// | `Conflict`           | 409    |
/// | `Consistency`        | 500    |
///
/// `Consistency` details stay in the log; the client gets a generic body.
pub fn domain_error_to_response(error: DomainError) -> Response {
    match error {
        DomainError::Validation(message) => {
            json_error(StatusCode::BAD_REQUEST, "validation", message)
        }
        DomainError::InvalidId(message) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", message)
        }
        DomainError::InvariantViolation(message) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(message) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Consistency(message) => {
            tracing::error!(%message, "consistency failure surfaced to the api");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal error",
            )
        }
    }
}
