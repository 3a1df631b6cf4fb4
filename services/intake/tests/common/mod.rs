#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use incident_intake::app::{AppState, build_router};
use incident_intake::auth::signature::SignatureVerifier;
use incident_intake::dispatch::{
    AlertDispatcher, DispatchError, ModalOpener, TicketDispatcher, TicketKey,
};
use incident_intake::model::IncidentRecord;
use incident_intake::pipeline::IntakePipeline;
use incident_intake::store::memory::InMemoryStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
pub const VERIFICATION_TOKEN: &str = "legacy-token";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[derive(Default)]
pub struct RecordingAlerts {
    pub sent: Mutex<Vec<IncidentRecord>>,
    pub fail: bool,
}

#[async_trait]
impl AlertDispatcher for RecordingAlerts {
    async fn send(&self, incident: &IncidentRecord) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push(incident.clone());
        if self.fail {
            return Err(DispatchError::Rejected {
                status: 503,
                body: "opsgenie unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTickets {
    pub opened: Mutex<Vec<i64>>,
}

#[async_trait]
impl TicketDispatcher for RecordingTickets {
    async fn open(&self, incident: &IncidentRecord) -> Result<TicketKey, DispatchError> {
        self.opened.lock().unwrap().push(incident.id);
        Ok(TicketKey(format!("SO-{}", 100 + incident.id)))
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub triggers: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl ModalOpener for RecordingOpener {
    async fn open_modal(&self, trigger_id: &str) -> Result<(), DispatchError> {
        self.triggers.lock().unwrap().push(trigger_id.to_string());
        if self.fail {
            return Err(DispatchError::Rejected {
                status: 200,
                body: "expired_trigger_id".to_string(),
            });
        }
        Ok(())
    }
}

pub struct TestApp {
    pub app: axum::routing::RouterIntoService<Body, ()>,
    pub store: Arc<InMemoryStore>,
    pub alerts: Arc<RecordingAlerts>,
    pub tickets: Arc<RecordingTickets>,
    pub opener: Arc<RecordingOpener>,
}

#[derive(Default)]
pub struct TestAppOptions {
    pub alerts_fail: bool,
    pub opener_fails: bool,
}

pub fn test_app(options: TestAppOptions) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let alerts = Arc::new(RecordingAlerts {
        fail: options.alerts_fail,
        ..Default::default()
    });
    let tickets = Arc::new(RecordingTickets::default());
    let opener = Arc::new(RecordingOpener {
        fail: options.opener_fails,
        ..Default::default()
    });
    let pipeline = IntakePipeline::new(
        store.clone(),
        alerts.clone(),
        tickets.clone(),
        opener.clone(),
        SignatureVerifier::new(SECRET, Some(Duration::from_secs(300))),
    )
    .with_verification_token(Some(VERIFICATION_TOKEN.to_string()))
    .with_dispatch_timeout(Duration::from_secs(2));
    TestApp {
        app: build_router(AppState::new(pipeline)).into_service(),
        store,
        alerts,
        tickets,
        opener,
    }
}

/// A complete incident form submission.
pub fn submission() -> serde_json::Value {
    serde_json::json!({
        "type": "view_submission",
        "token": VERIFICATION_TOKEN,
        "user": {"id": "U024BE7LH", "username": "oncall"},
        "view": {
            "id": "V0PKB1ZFV",
            "callback_id": "incident_form",
            "state": {"values": {
                "description": {"description_action": {"type": "plain_text_input", "value": "db outage"}},
                "affected_products": {"affected_products_action": {
                    "type": "multi_static_select",
                    "selected_options": [{"value": "product_1"}]
                }},
                "severity": {"severity_action": {
                    "type": "static_select",
                    "selected_option": {"value": "high"}
                }},
                "suspected_owning_team": {"suspected_owning_team_action": {
                    "type": "multi_static_select",
                    "selected_options": [{"value": "team_1"}]
                }},
                "start_time": {"start_time_action": {"type": "datepicker", "selected_date": "2024-01-01"}},
                "start_time_picker": {"start_time_picker_action": {"type": "timepicker", "selected_time": "00:00"}},
                "end_time": {"end_time_action": {"type": "datepicker", "selected_date": "2024-01-01"}},
                "end_time_picker": {"end_time_picker_action": {"type": "timepicker", "selected_time": "01:00"}},
                "p1_customer_affected": {"p1_customer_affected_action": {"type": "checkboxes", "selected_options": []}},
                "suspected_affected_components": {"suspected_affected_components_action": {
                    "type": "multi_static_select",
                    "selected_options": [{"value": "component_1"}]
                }},
                "message_for_sp": {"message_for_sp_action": {"type": "plain_text_input", "value": null}},
                "flags_for_statuspage_notification": {"flags_for_statuspage_notification_action": {
                    "type": "checkboxes",
                    "selected_options": [{"value": "statuspage_notification"}]
                }}
            }}
        }
    })
}

/// Remove one block from the submission's state values.
pub fn without_block(mut payload: serde_json::Value, block_id: &str) -> serde_json::Value {
    payload["view"]["state"]["values"]
        .as_object_mut()
        .expect("values")
        .remove(block_id);
    payload
}

pub fn payload_form(payload: &serde_json::Value) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("payload", &payload.to_string())
        .finish()
}
