//! Inbound interaction request bodies.
//!
//! Slack delivers modal submissions as a URL-encoded form with a single
//! `payload` field holding JSON, and URL-verification handshakes as a plain
//! JSON document. Both arrive on the same endpoint.
use super::decoder::DecodeError;
use super::payload::InteractionPayload;
use serde::Deserialize;

const URL_VERIFICATION: &str = "url_verification";

#[derive(Debug, Clone)]
pub enum InboundInteraction {
    /// URL-verification handshake; the challenge is echoed back unmodified.
    Challenge(String),
    Interaction(InteractionPayload),
}

#[derive(Debug, Deserialize)]
struct ChallengeRequest {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    challenge: Option<String>,
}

impl InboundInteraction {
    /// Parse a raw, already-authenticated request body.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, DecodeError> {
        let is_json = content_type
            .map(|value| value.trim_start().starts_with("application/json"))
            .unwrap_or(false);
        if is_json {
            return Self::from_json(body);
        }
        Self::from_form(body)
    }

    fn from_json(body: &[u8]) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;
        if let Ok(request) = ChallengeRequest::deserialize(&value) {
            if request.kind == URL_VERIFICATION {
                let challenge = request.challenge.ok_or(DecodeError::MissingField("challenge"))?;
                return Ok(Self::Challenge(challenge));
            }
        }
        serde_json::from_value(value)
            .map(Self::Interaction)
            .map_err(|err| DecodeError::MalformedPayload(err.to_string()))
    }

    fn from_form(body: &[u8]) -> Result<Self, DecodeError> {
        let payload = url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .ok_or(DecodeError::MissingField("payload"))?;
        Self::from_json(payload.as_bytes())
    }
}
