//! Slack webhook handlers.
//!
//! # Purpose and responsibility
//! Accepts slash commands and interaction callbacks, hands the raw request to
//! the intake pipeline, and shapes the pipeline outcome into Slack-facing
//! responses.
//!
//! # Key invariants and assumptions
//! - Bodies are taken as raw bytes; the signature covers the exact bytes
//!   received, so nothing is parsed before the pipeline verifies them.
//!
//! # Security considerations
//! - Both endpoints are reachable from the internet and rely entirely on the
//!   request signature for authentication.
use crate::api::types::{ChallengeResponse, IssueKeyResponse, SlashCommandResponse};
use crate::app::AppState;
use crate::auth::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::observability;
use crate::pipeline::{IntakeError, InteractionOutcome, RequestAuth};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

const MODAL_OPENED_TEXT: &str = "Opening the incident form.";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn request_auth(headers: &HeaderMap) -> RequestAuth<'_> {
    RequestAuth {
        timestamp: header_str(headers, TIMESTAMP_HEADER),
        signature: header_str(headers, SIGNATURE_HEADER),
    }
}

fn error_outcome(err: &IntakeError) -> &'static str {
    match err {
        IntakeError::Auth(_) | IntakeError::InvalidToken => "unauthenticated",
        _ if err.is_not_found() => "ignored",
        IntakeError::Decode(_) | IntakeError::Validation(_) => "rejected",
        IntakeError::PartialFailure(_) => "partial_failure",
        IntakeError::ModalOpen(_) => "upstream_error",
        IntakeError::Store(_) | IntakeError::Task(_) | IntakeError::UnknownCommand(_) => "error",
    }
}

#[utoipa::path(
    post,
    path = "/slack/commands",
    tag = "slack",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Incident form opened", body = SlashCommandResponse),
        (status = 400, description = "Signature or token rejected", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown command", body = crate::api::types::ErrorResponse),
        (status = 502, description = "Slack rejected the form", body = crate::api::types::ErrorResponse)
    )
)]
/// Handle a slash command; `/create-incident` opens the incident form.
pub(crate) async fn slash_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SlashCommandResponse>, IntakeError> {
    let now = chrono::Utc::now().timestamp();
    match state
        .intake
        .handle_command(&body, request_auth(&headers), now)
        .instrument(observability::intake_span("commands"))
        .await
    {
        Ok(()) => {
            observability::record_request("commands", "ok");
            Ok(Json(SlashCommandResponse::ephemeral(MODAL_OPENED_TEXT)))
        }
        Err(err) => {
            observability::record_request("commands", error_outcome(&err));
            Err(err)
        }
    }
}

#[utoipa::path(
    post,
    path = "/slack/interactions",
    tag = "slack",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "URL verification challenge echoed", body = ChallengeResponse),
        (status = 201, description = "Incident recorded and dispatched", body = IssueKeyResponse),
        (status = 400, description = "Rejected request", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Interaction not handled", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Incident could not be stored", body = crate::api::types::ErrorResponse),
        (status = 502, description = "Incident stored but not fully dispatched", body = crate::api::types::DispatchFailureResponse)
    )
)]
/// Handle an interaction callback from the incident form.
pub(crate) async fn interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let now = chrono::Utc::now().timestamp();
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str());
    let result = state
        .intake
        .handle_interaction(content_type, &body, request_auth(&headers), now)
        .instrument(observability::intake_span("interactions"))
        .await;
    match result {
        Ok(InteractionOutcome::Challenge(challenge)) => {
            observability::record_request("interactions", "challenge");
            Json(ChallengeResponse { challenge }).into_response()
        }
        Ok(InteractionOutcome::Created {
            incident_id,
            issue_key,
        }) => {
            observability::record_request("interactions", "created");
            tracing::info!(incident_id, issue_key = %issue_key, "incident intake complete");
            (
                StatusCode::CREATED,
                Json(IssueKeyResponse {
                    issue_key: issue_key.0,
                }),
            )
                .into_response()
        }
        Err(err) => {
            observability::record_request("interactions", error_outcome(&err));
            if err.is_not_found() {
                tracing::debug!(reason = %err, "interaction ignored");
            }
            err.into_response()
        }
    }
}
