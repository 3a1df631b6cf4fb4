//! Jira ticket dispatcher.
//!
//! Opens one issue per incident through the REST v2 `issue` endpoint using
//! basic authentication with an account email and API token. The returned
//! issue key is what the interaction endpoint echoes back to the submitter.
use super::{
    DispatchError, TicketDispatcher, TicketKey, describe_incident, ensure_success, join,
};
use crate::model::IncidentRecord;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Clone, PartialEq, Eq)]
pub struct JiraSettings {
    pub server: String,
    pub email: String,
    pub api_key: String,
    pub project_key: String,
    pub issue_type: String,
    pub start_time_field: Option<String>,
}

impl std::fmt::Debug for JiraSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraSettings")
            .field("server", &self.server)
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .field("project_key", &self.project_key)
            .field("issue_type", &self.issue_type)
            .field("start_time_field", &self.start_time_field)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: Option<String>,
}

#[derive(Clone)]
pub struct JiraTickets {
    client: reqwest::Client,
    settings: JiraSettings,
}

impl JiraTickets {
    pub fn new(client: reqwest::Client, settings: JiraSettings) -> Self {
        Self { client, settings }
    }

    fn issue_url(&self) -> String {
        format!(
            "{}/rest/api/2/issue",
            self.settings.server.trim_end_matches('/')
        )
    }

    fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.settings.email, self.settings.api_key);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }

    pub(crate) fn issue_body(&self, incident: &IncidentRecord) -> Value {
        let draft = &incident.incident;
        let mut fields = Map::new();
        fields.insert(
            "project".to_string(),
            json!({ "key": self.settings.project_key }),
        );
        fields.insert(
            "summary".to_string(),
            Value::String(format!(
                "Incident: {} - {}",
                join(draft.affected_products()),
                draft.severity()
            )),
        );
        fields.insert(
            "description".to_string(),
            Value::String(describe_incident(incident)),
        );
        fields.insert(
            "issuetype".to_string(),
            json!({ "name": self.settings.issue_type }),
        );
        if let Some(field) = &self.settings.start_time_field {
            fields.insert(
                field.clone(),
                Value::String(draft.start_time().format("%Y-%m-%dT%H:%M:%S").to_string()),
            );
        }
        json!({ "fields": fields })
    }
}

#[async_trait]
impl TicketDispatcher for JiraTickets {
    async fn open(&self, incident: &IncidentRecord) -> Result<TicketKey, DispatchError> {
        let response = self
            .client
            .post(self.issue_url())
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&self.issue_body(incident))
            .send()
            .await?;
        let created: CreatedIssue = ensure_success(response).await?.json().await?;
        let key = created
            .key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DispatchError::InvalidResponse("issue key missing".to_string()))?;
        tracing::debug!(incident_id = incident.id, issue_key = %key, "jira issue created");
        Ok(TicketKey(key))
    }
}
