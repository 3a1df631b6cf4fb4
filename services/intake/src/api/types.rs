//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the payload shapes returned by the intake endpoints and collected
//! into the OpenAPI document.
use crate::model::IncidentRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
    pub durable_storage: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Body returned when an incident was stored but a downstream step failed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchFailureResponse {
    pub code: String,
    pub message: String,
    pub incident_id: i64,
    pub failed_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueKeyResponse {
    pub issue_key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// Slack message posted back to the user who ran a slash command.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlashCommandResponse {
    pub response_type: String,
    pub text: String,
}

impl SlashCommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IncidentListResponse {
    pub items: Vec<IncidentRecord>,
}
