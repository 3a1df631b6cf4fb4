//! Slack `views.open` client used by the slash command to show the form.
use super::{DispatchError, ModalOpener, ensure_success};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

const INCIDENT_MODAL: &str = include_str!("../../assets/incident_modal.json");

/// The incident form view definition.
pub fn incident_modal_view() -> Result<Value, serde_json::Error> {
    serde_json::from_str(INCIDENT_MODAL)
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackModalOpener {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    view: Value,
}

impl std::fmt::Debug for SlackModalOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackModalOpener")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl SlackModalOpener {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            client,
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            view: incident_modal_view()?,
        })
    }

    fn views_open_url(&self) -> String {
        format!("{}/views.open", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModalOpener for SlackModalOpener {
    async fn open_modal(&self, trigger_id: &str) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.views_open_url())
            .bearer_auth(&self.bot_token)
            .json(&json!({ "trigger_id": trigger_id, "view": self.view }))
            .send()
            .await?;
        let status = response.status().as_u16();
        let reply: SlackApiResponse = ensure_success(response).await?.json().await?;
        if !reply.ok {
            // Slack reports API failures with HTTP 200 and `ok: false`.
            return Err(DispatchError::Rejected {
                status,
                body: reply.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        Ok(())
    }
}
