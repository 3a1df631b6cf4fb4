//! OpenAPI schema aggregation for the intake API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::{
    incidents, slack, system,
    types::{
        ChallengeResponse, DispatchFailureResponse, ErrorResponse, HealthStatus,
        IncidentListResponse, IssueKeyResponse, SlashCommandResponse,
    },
};
use crate::model::{IncidentDraft, IncidentRecord, Severity};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "incident-intake",
        version = "v1",
        description = "Slack incident intake service HTTP API"
    ),
    paths(
        system::system_health,
        slack::slash_command,
        slack::interaction,
        incidents::list_incidents,
        incidents::get_incident
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        DispatchFailureResponse,
        IssueKeyResponse,
        ChallengeResponse,
        SlashCommandResponse,
        IncidentListResponse,
        IncidentRecord,
        IncidentDraft,
        Severity
    )),
    tags(
        (name = "system", description = "System and health endpoints"),
        (name = "slack", description = "Slack slash command and interaction webhooks"),
        (name = "incidents", description = "Recorded incidents")
    )
)]
pub struct ApiDoc;
