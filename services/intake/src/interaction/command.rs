//! Slash command form bodies.

pub const CREATE_INCIDENT_COMMAND: &str = "/create-incident";

/// Fields of a slash command invocation that the service acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashCommand {
    pub token: Option<String>,
    pub command: String,
    pub trigger_id: Option<String>,
    pub user_id: Option<String>,
}

impl SlashCommand {
    /// Parse a URL-encoded command body; unknown fields are ignored.
    pub fn parse(body: &[u8]) -> Self {
        let mut command = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let value = value.trim().to_string();
            match key.as_ref() {
                "token" => command.token = Some(value),
                "command" => command.command = value,
                "trigger_id" => command.trigger_id = Some(value).filter(|v| !v.is_empty()),
                "user_id" => command.user_id = Some(value).filter(|v| !v.is_empty()),
                _ => {}
            }
        }
        command
    }

    pub fn is_create_incident(&self) -> bool {
        self.command == CREATE_INCIDENT_COMMAND
    }
}
