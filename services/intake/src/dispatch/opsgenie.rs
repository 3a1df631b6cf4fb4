//! Opsgenie alert dispatcher.
use super::{AlertDispatcher, DispatchError, describe_incident, ensure_success, join, truncate};
use crate::model::{IncidentRecord, Severity};
use async_trait::async_trait;
use serde::Serialize;

/// Opsgenie rejects alert messages longer than this.
const MAX_MESSAGE_CHARS: usize = 130;
const MAX_DESCRIPTION_CHARS: usize = 15_000;

#[derive(Clone, PartialEq, Eq)]
pub struct OpsgenieSettings {
    pub api_base: String,
    pub api_key: String,
}

impl std::fmt::Debug for OpsgenieSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsgenieSettings")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct AlertRequest {
    message: String,
    alias: String,
    description: String,
    priority: &'static str,
    tags: Vec<String>,
}

pub fn priority_for(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "P1",
        Severity::Medium => "P2",
        Severity::Low => "P3",
    }
}

#[derive(Clone)]
pub struct OpsgenieAlerts {
    client: reqwest::Client,
    settings: OpsgenieSettings,
}

impl OpsgenieAlerts {
    pub fn new(client: reqwest::Client, settings: OpsgenieSettings) -> Self {
        Self { client, settings }
    }

    fn alerts_url(&self) -> String {
        format!("{}/v2/alerts", self.settings.api_base.trim_end_matches('/'))
    }

    fn request_for(incident: &IncidentRecord) -> AlertRequest {
        let draft = &incident.incident;
        let message = format!(
            "Incident #{}: {} ({})",
            incident.id,
            join(draft.affected_products()),
            draft.severity()
        );
        AlertRequest {
            message: truncate(&message, MAX_MESSAGE_CHARS),
            alias: format!("incident-{}", incident.id),
            description: truncate(&describe_incident(incident), MAX_DESCRIPTION_CHARS),
            priority: priority_for(draft.severity()),
            tags: draft.affected_products().iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl AlertDispatcher for OpsgenieAlerts {
    async fn send(&self, incident: &IncidentRecord) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.alerts_url())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("GenieKey {}", self.settings.api_key),
            )
            .json(&Self::request_for(incident))
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::debug!(incident_id = incident.id, "opsgenie alert accepted");
        Ok(())
    }
}
