//! Downstream integrations invoked for each persisted incident.
//!
//! # Purpose
//! Defines the collaborator contracts the orchestrator calls after an
//! incident is stored ([`AlertDispatcher`], [`TicketDispatcher`]) and the
//! [`ModalOpener`] used by the slash command, together with their HTTP
//! implementations.
//!
//! # Notes
//! Implementations are constructed explicitly at startup and injected through
//! application state; nothing here holds process-wide clients.
use crate::model::IncidentRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

pub mod disabled;
pub mod jira;
pub mod opsgenie;
pub mod slack;

pub use disabled::DisabledDispatcher;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Identifier of a ticket opened by a [`TicketDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TicketKey(pub String);

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn send(&self, incident: &IncidentRecord) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait TicketDispatcher: Send + Sync {
    async fn open(&self, incident: &IncidentRecord) -> Result<TicketKey, DispatchError>;
}

#[async_trait]
pub trait ModalOpener: Send + Sync {
    async fn open_modal(&self, trigger_id: &str) -> Result<(), DispatchError>;
}

/// Multi-line, human-readable rendering shared by alert and ticket bodies.
pub(crate) fn describe_incident(record: &IncidentRecord) -> String {
    let incident = &record.incident;
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    format!(
        "Incident ID: {id}\n\
         Description: {description}\n\
         Severity: {severity}\n\
         Affected Products: {products}\n\
         Suspected Owning Team: {teams}\n\
         Start Time: {start}\n\
         End Time: {end}\n\
         Customer Affected: {p1}\n\
         Suspected Affected Components: {components}\n\
         Message for SP: {message}\n\
         Status Page Notification: {statuspage}\n\
         Separate Channel Creation: {channel}",
        id = record.id,
        description = incident.description(),
        severity = incident.severity(),
        products = join(incident.affected_products()),
        teams = join(incident.suspected_owning_team()),
        start = incident.start_time().format("%Y-%m-%dT%H:%M:%S"),
        end = incident.end_time().format("%Y-%m-%dT%H:%M:%S"),
        p1 = yes_no(incident.p1_customer_affected()),
        components = join(incident.suspected_affected_components()),
        message = incident.message_for_support().unwrap_or("N/A"),
        statuspage = yes_no(incident.statuspage_notification()),
        channel = yes_no(incident.separate_channel_creation()),
    )
}

pub(crate) fn join<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map a non-success response into [`DispatchError::Rejected`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, DispatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DispatchError::Rejected {
        status: status.as_u16(),
        body: truncate(&body, 512),
    })
}

pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_lists_every_field() {
        let text = describe_incident(&test_support::record());
        assert!(text.contains("Incident ID: 42"));
        assert!(text.contains("Description: db outage"));
        assert!(text.contains("Severity: high"));
        assert!(text.contains("Affected Products: product_1, product_2"));
        assert!(text.contains("Start Time: 2024-01-01T00:00:00"));
        assert!(text.contains("Customer Affected: Yes"));
        assert!(text.contains("Message for SP: N/A"));
        assert!(text.contains("Status Page Notification: Yes"));
        assert!(text.contains("Separate Channel Creation: No"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 10), "short");
    }
}
