//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint returns the
//! same error shape, and maps intake outcomes onto status codes in one place.
//!
//! # Key invariants and assumptions
//! - Error responses include a stable `code` and a human-readable `message`.
//! - A partially dispatched incident is reported with its `incident_id` so the
//!   submitter can follow up on the stored record.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Signature failures never echo the expected signature.
use crate::api::types::{DispatchFailureResponse, ErrorResponse};
use crate::interaction::DecodeError;
use crate::pipeline::{IntakeError, PartialFailure};
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use incident_intake::api::error::ApiError;
/// use incident_intake::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::NOT_FOUND,
///     body: ErrorResponse {
///         code: "not_found".to_string(),
///         message: "missing".to_string(),
///         request_id: None,
///     },
/// };
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 400 error for a request whose signature did not verify.
pub fn api_invalid_signature(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "invalid_signature", message)
}

/// Build a 400 error for a request carrying the wrong verification token.
pub fn api_invalid_token(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "invalid_token", message)
}

/// Build a 400 error for a payload that could not be decoded.
pub fn api_decode_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "decode_error", message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Build a 502 error for a failed call to an upstream service.
pub fn api_upstream_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_GATEWAY, "upstream_error", message)
}

/// Build a 500 Internal Server Error from a store error.
///
/// Logs the store error and returns a generic internal error response.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "incident storage error");
    api_internal_message(message)
}

/// Build a 500 Internal Server Error without a store error.
pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Error body for an incident that was stored but not fully dispatched.
#[derive(Debug)]
pub struct DispatchFailure(pub DispatchFailureResponse);

impl From<&PartialFailure> for DispatchFailure {
    fn from(partial: &PartialFailure) -> Self {
        Self(DispatchFailureResponse {
            code: "dispatch_failed".to_string(),
            message: partial.to_string(),
            incident_id: partial.incident_id,
            failed_steps: partial
                .failed_steps()
                .into_iter()
                .map(str::to_string)
                .collect(),
            issue_key: partial.issue_key.as_ref().map(|key| key.0.clone()),
        })
    }
}

impl IntoResponse for DispatchFailure {
    fn into_response(self) -> Response {
        (StatusCode::BAD_GATEWAY, Json(self.0)).into_response()
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        match &self {
            IntakeError::PartialFailure(partial) => {
                for failure in &partial.failures {
                    tracing::error!(
                        incident_id = partial.incident_id,
                        step = failure.step.as_str(),
                        error = %failure.error,
                        "incident dispatch failed"
                    );
                }
                DispatchFailure::from(partial).into_response()
            }
            _ => ApiError::from(self).into_response(),
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Auth(err) => {
                tracing::warn!(error = %err, "rejected unsigned or mis-signed request");
                api_invalid_signature(&err.to_string())
            }
            IntakeError::InvalidToken => api_invalid_token("invalid verification token"),
            IntakeError::Decode(err @ DecodeError::UnrecognizedInteraction { .. }) => {
                api_not_found(&err.to_string())
            }
            IntakeError::UnknownCommand(command) => {
                api_not_found(&format!("command not found: {command}"))
            }
            IntakeError::Decode(err) => api_decode_error(&err.to_string()),
            IntakeError::Validation(err) => api_validation_error(&err.to_string()),
            IntakeError::Store(err) => api_internal("failed to record incident", &err),
            IntakeError::ModalOpen(err) => {
                tracing::error!(error = %err, "failed to open incident form");
                api_upstream_error("failed to open the incident form")
            }
            IntakeError::PartialFailure(partial) => {
                let body = DispatchFailure::from(&partial).0;
                api_error(StatusCode::BAD_GATEWAY, &body.code, &body.message)
            }
            IntakeError::Task(err) => {
                tracing::error!(error = %err, "intake task failed");
                api_internal_message("failed to process incident")
            }
        }
    }
}
