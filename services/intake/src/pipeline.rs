//! Incident intake orchestration.
//!
//! # Purpose and responsibility
//! Drives one inbound Slack request through verification, decoding,
//! persistence and downstream dispatch, and reports a single typed outcome
//! that the HTTP layer maps onto a response.
//!
//! # Key invariants and assumptions
//! - Nothing is decoded or stored before the request signature verifies.
//! - A draft that fails validation is never persisted.
//! - Once an incident is persisted it stays persisted; dispatch failures are
//!   reported alongside the incident id rather than rolled back.
//! - The store write, alerting and ticketing run sequentially, each bounded
//!   by the dispatch timeout, and ticketing is attempted even when alerting
//!   failed. A store write that times out is a store error and nothing is
//!   dispatched.
//! - Persistence and dispatch run on a spawned task so a dropped client
//!   connection does not abandon downstream calls half way.
use crate::auth::signature::{AuthError, SignatureVerifier};
use crate::auth::verification_token_matches;
use crate::dispatch::{AlertDispatcher, DispatchError, ModalOpener, TicketDispatcher, TicketKey};
use crate::interaction::{DecodeError, InboundInteraction, SlashCommand, decode};
use crate::model::{IncidentDraft, IncidentRecord, ValidationError};
use crate::observability;
use crate::store::{IncidentStore, StoreError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

/// Stages a submission moves through; used for logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Verified,
    Decoded,
    Persisted,
    Alerted,
    Ticketed,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Verified => "verified",
            Stage::Decoded => "decoded",
            Stage::Persisted => "persisted",
            Stage::Alerted => "alerted",
            Stage::Ticketed => "ticketed",
            Stage::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStep {
    Alert,
    Ticket,
}

impl DispatchStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStep::Alert => "alert",
            DispatchStep::Ticket => "ticket",
        }
    }
}

#[derive(Debug)]
pub struct StepFailure {
    pub step: DispatchStep,
    pub error: DispatchError,
}

/// An incident that was stored but not fully dispatched.
#[derive(Debug)]
pub struct PartialFailure {
    pub incident_id: i64,
    pub failures: Vec<StepFailure>,
    pub issue_key: Option<TicketKey>,
}

impl PartialFailure {
    pub fn failed_steps(&self) -> Vec<&'static str> {
        self.failures
            .iter()
            .map(|failure| failure.step.as_str())
            .collect()
    }
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incident {} was recorded but {} failed",
            self.incident_id,
            self.failed_steps().join(" and ")
        )
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("verification token mismatch")]
    InvalidToken,
    #[error(transparent)]
    Decode(DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to open incident form: {0}")]
    ModalOpen(DispatchError),
    #[error("{0}")]
    PartialFailure(PartialFailure),
    #[error("intake task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<DecodeError> for IntakeError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Validation(inner) => IntakeError::Validation(inner),
            other => IntakeError::Decode(other),
        }
    }
}

impl IntakeError {
    /// Outcomes that are expected traffic rather than service faults.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IntakeError::Decode(DecodeError::UnrecognizedInteraction { .. })
                | IntakeError::UnknownCommand(_)
        )
    }
}

/// Headers used to authenticate a Slack request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestAuth<'a> {
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
}

#[derive(Debug)]
pub enum InteractionOutcome {
    Challenge(String),
    Created {
        incident_id: i64,
        issue_key: TicketKey,
    },
}

/// Owns the collaborators a submission flows through.
pub struct IntakePipeline {
    store: Arc<dyn IncidentStore>,
    alerts: Arc<dyn AlertDispatcher>,
    tickets: Arc<dyn TicketDispatcher>,
    modal_opener: Arc<dyn ModalOpener>,
    verifier: SignatureVerifier,
    verification_token: Option<String>,
    dispatch_timeout: Duration,
}

impl fmt::Debug for IntakePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntakePipeline")
            .field("backend", &self.store.backend_name())
            .field("verifier", &self.verifier)
            .field("dispatch_timeout", &self.dispatch_timeout)
            .finish_non_exhaustive()
    }
}

impl IntakePipeline {
    pub fn new(
        store: Arc<dyn IncidentStore>,
        alerts: Arc<dyn AlertDispatcher>,
        tickets: Arc<dyn TicketDispatcher>,
        modal_opener: Arc<dyn ModalOpener>,
        verifier: SignatureVerifier,
    ) -> Self {
        Self {
            store,
            alerts,
            tickets,
            modal_opener,
            verifier,
            verification_token: None,
            dispatch_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_verification_token(mut self, token: Option<String>) -> Self {
        self.verification_token = token;
        self
    }

    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn IncidentStore> {
        &self.store
    }

    /// Handle a POST to the interactions endpoint.
    pub async fn handle_interaction(
        self: &Arc<Self>,
        content_type: Option<&str>,
        body: &[u8],
        auth: RequestAuth<'_>,
        now: i64,
    ) -> Result<InteractionOutcome, IntakeError> {
        enter_stage(Stage::Received);
        let verified = self
            .verifier
            .verify(body, auth.timestamp, auth.signature, now)?;
        enter_stage(Stage::Verified);

        let payload = match InboundInteraction::parse(content_type, verified.body())? {
            InboundInteraction::Challenge(challenge) => {
                return Ok(InteractionOutcome::Challenge(challenge));
            }
            InboundInteraction::Interaction(payload) => payload,
        };
        self.check_token(payload.token.as_deref())?;
        let draft = decode(&payload)?;
        enter_stage(Stage::Decoded);
        tracing::debug!(
            user = payload.user.as_ref().and_then(|user| user.id.as_deref()),
            "incident form decoded"
        );

        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.record_and_dispatch(draft).await }.in_current_span())
            .await?
    }

    /// Handle a POST to the slash command endpoint.
    pub async fn handle_command(
        &self,
        body: &[u8],
        auth: RequestAuth<'_>,
        now: i64,
    ) -> Result<(), IntakeError> {
        let verified = self
            .verifier
            .verify(body, auth.timestamp, auth.signature, now)?;
        enter_stage(Stage::Verified);
        let command = SlashCommand::parse(verified.body());
        self.check_token(command.token.as_deref())?;
        if !command.is_create_incident() {
            return Err(IntakeError::UnknownCommand(command.command));
        }
        let trigger_id = command
            .trigger_id
            .ok_or(IntakeError::Decode(DecodeError::MissingField("trigger_id")))?;
        let result = self
            .bounded("modal", self.modal_opener.open_modal(&trigger_id))
            .await;
        result.map_err(IntakeError::ModalOpen)
    }

    fn check_token(&self, provided: Option<&str>) -> Result<(), IntakeError> {
        if verification_token_matches(self.verification_token.as_deref(), provided) {
            Ok(())
        } else {
            Err(IntakeError::InvalidToken)
        }
    }

    async fn record_and_dispatch(
        &self,
        draft: IncidentDraft,
    ) -> Result<InteractionOutcome, IntakeError> {
        let write = tokio::time::timeout(self.dispatch_timeout, self.store.create(draft));
        let record = match write.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(IntakeError::Store(StoreError::Unexpected(anyhow::anyhow!(
                    "incident write did not finish within {:?}",
                    self.dispatch_timeout
                ))));
            }
        };
        enter_stage(Stage::Persisted);
        observability::record_incident_id(record.id);
        tracing::info!(
            incident_id = record.id,
            severity = %record.incident.severity(),
            "incident recorded"
        );
        self.dispatch(&record).await
    }

    async fn dispatch(&self, record: &IncidentRecord) -> Result<InteractionOutcome, IntakeError> {
        let mut failures = Vec::new();

        match self
            .bounded(DispatchStep::Alert.as_str(), self.alerts.send(record))
            .await
        {
            Ok(()) => enter_stage(Stage::Alerted),
            Err(error) => failures.push(StepFailure {
                step: DispatchStep::Alert,
                error,
            }),
        }

        let issue_key = match self
            .bounded(DispatchStep::Ticket.as_str(), self.tickets.open(record))
            .await
        {
            Ok(key) => {
                enter_stage(Stage::Ticketed);
                Some(key)
            }
            Err(error) => {
                failures.push(StepFailure {
                    step: DispatchStep::Ticket,
                    error,
                });
                None
            }
        };

        match issue_key {
            Some(issue_key) if failures.is_empty() => {
                enter_stage(Stage::Done);
                tracing::info!(
                    incident_id = record.id,
                    issue_key = %issue_key,
                    "incident dispatched"
                );
                Ok(InteractionOutcome::Created {
                    incident_id: record.id,
                    issue_key,
                })
            }
            issue_key => Err(IntakeError::PartialFailure(PartialFailure {
                incident_id: record.id,
                failures,
                issue_key,
            })),
        }
    }

    /// Run one downstream call under the dispatch timeout and record its outcome.
    async fn bounded<T, F>(&self, target: &'static str, call: F) -> Result<T, DispatchError>
    where
        F: Future<Output = Result<T, DispatchError>>,
    {
        let result = match tokio::time::timeout(self.dispatch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.dispatch_timeout)),
        };
        let outcome = match &result {
            Ok(_) => "ok",
            Err(DispatchError::NotConfigured(_)) => "disabled",
            Err(DispatchError::Timeout(_)) => "timeout",
            Err(_) => "error",
        };
        observability::record_dispatch(target, outcome);
        if let Err(err) = &result {
            tracing::warn!(target_system = target, error = %err, "downstream call failed");
        }
        result
    }
}

fn enter_stage(stage: Stage) {
    observability::record_stage(stage.as_str());
    tracing::debug!(stage = stage.as_str(), "intake stage reached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::signature::compute_signature;
    use crate::dispatch::DisabledDispatcher;
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SECRET: &str = "signing-secret";
    const NOW: i64 = 1_720_000_000;

    #[derive(Default)]
    struct RecordingAlerts {
        sent: Mutex<Vec<i64>>,
        fail: bool,
    }

    #[async_trait]
    impl AlertDispatcher for RecordingAlerts {
        async fn send(&self, incident: &IncidentRecord) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push(incident.id);
            if self.fail {
                return Err(DispatchError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    struct FixedTickets;

    #[async_trait]
    impl TicketDispatcher for FixedTickets {
        async fn open(&self, incident: &IncidentRecord) -> Result<TicketKey, DispatchError> {
            Ok(TicketKey(format!("SO-{}", incident.id)))
        }
    }

    #[derive(Default)]
    struct RecordingTickets {
        opened: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl TicketDispatcher for RecordingTickets {
        async fn open(&self, incident: &IncidentRecord) -> Result<TicketKey, DispatchError> {
            self.opened.lock().unwrap().push(incident.id);
            Ok(TicketKey(format!("SO-{}", incident.id)))
        }
    }

    /// Store whose writes either fail outright or never complete.
    struct BrokenStore {
        hangs: bool,
    }

    #[async_trait]
    impl IncidentStore for BrokenStore {
        async fn create(&self, _draft: IncidentDraft) -> Result<IncidentRecord, StoreError> {
            if self.hangs {
                std::future::pending::<()>().await;
            }
            Err(StoreError::Unexpected(anyhow::anyhow!(
                "connection reset by peer"
            )))
        }

        async fn get(&self, id: i64) -> Result<IncidentRecord, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }

        async fn list(&self, _limit: usize) -> Result<Vec<IncidentRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn is_durable(&self) -> bool {
            true
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    struct SlowTickets;

    #[async_trait]
    impl TicketDispatcher for SlowTickets {
        async fn open(&self, _incident: &IncidentRecord) -> Result<TicketKey, DispatchError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(TicketKey("SO-late".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        triggers: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ModalOpener for RecordingOpener {
        async fn open_modal(&self, trigger_id: &str) -> Result<(), DispatchError> {
            self.triggers.lock().unwrap().push(trigger_id.to_string());
            Ok(())
        }
    }

    fn submission() -> serde_json::Value {
        serde_json::json!({
            "type": "view_submission",
            "token": "legacy",
            "user": {"id": "U1"},
            "view": {
                "callback_id": "incident_form",
                "state": {"values": {
                    "description": {"description_action": {"type": "plain_text_input", "value": "db outage"}},
                    "affected_products": {"affected_products_action": {"selected_options": [{"value": "product_1"}]}},
                    "severity": {"severity_action": {"selected_option": {"value": "high"}}},
                    "suspected_owning_team": {"suspected_owning_team_action": {"selected_options": [{"value": "team_1"}]}},
                    "start_time": {"start_time_action": {"selected_date": "2024-01-01"}},
                    "start_time_picker": {"start_time_picker_action": {"selected_time": "00:00"}},
                    "end_time": {"end_time_action": {"selected_date": "2024-01-01"}},
                    "end_time_picker": {"end_time_picker_action": {"selected_time": "01:00"}},
                    "suspected_affected_components": {"suspected_affected_components_action": {"selected_options": [{"value": "component_1"}]}}
                }}
            }
        })
    }

    fn form(payload: &serde_json::Value) -> Vec<u8> {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload.to_string())
            .finish()
            .into_bytes()
    }

    fn submission_body() -> Vec<u8> {
        form(&submission())
    }

    fn signed(body: &[u8]) -> (String, String) {
        let ts = NOW.to_string();
        let sig = compute_signature(SECRET, &ts, body);
        (ts, sig)
    }

    fn pipeline(
        store: Arc<dyn IncidentStore>,
        alerts: Arc<dyn AlertDispatcher>,
        tickets: Arc<dyn TicketDispatcher>,
    ) -> Arc<IntakePipeline> {
        Arc::new(
            IntakePipeline::new(
                store,
                alerts,
                tickets,
                Arc::new(RecordingOpener::default()),
                SignatureVerifier::new(SECRET, Some(Duration::from_secs(300))),
            )
            .with_dispatch_timeout(Duration::from_millis(200)),
        )
    }

    async fn submit(
        pipeline: &Arc<IntakePipeline>,
        body: &[u8],
    ) -> Result<InteractionOutcome, IntakeError> {
        let (ts, sig) = signed(body);
        pipeline
            .handle_interaction(
                Some("application/x-www-form-urlencoded"),
                body,
                RequestAuth {
                    timestamp: Some(&ts),
                    signature: Some(&sig),
                },
                NOW,
            )
            .await
    }

    #[tokio::test]
    async fn happy_path_persists_alerts_and_tickets() {
        let store = Arc::new(InMemoryStore::new());
        let alerts = Arc::new(RecordingAlerts::default());
        let pipeline = pipeline(store.clone(), alerts.clone(), Arc::new(FixedTickets));

        let outcome = submit(&pipeline, &submission_body()).await.expect("created");
        match outcome {
            InteractionOutcome::Created {
                incident_id,
                issue_key,
            } => {
                assert_eq!(incident_id, 1);
                assert_eq!(issue_key, TicketKey("SO-1".to_string()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(*alerts.sent.lock().unwrap(), vec![1]);
        let stored = store.get(1).await.expect("stored");
        assert_eq!(stored.incident.description(), "db outage");
    }

    #[tokio::test]
    async fn bad_signature_stops_before_anything_is_stored() {
        let store = Arc::new(InMemoryStore::new());
        let alerts = Arc::new(RecordingAlerts::default());
        let pipeline = pipeline(store.clone(), alerts.clone(), Arc::new(FixedTickets));
        let body = submission_body();
        let ts = NOW.to_string();

        let err = pipeline
            .handle_interaction(
                None,
                &body,
                RequestAuth {
                    timestamp: Some(&ts),
                    signature: Some("v0=deadbeef"),
                },
                NOW,
            )
            .await
            .expect_err("rejected");
        assert!(matches!(err, IntakeError::Auth(AuthError::SignatureMismatch)));
        assert!(store.list(10).await.expect("list").is_empty());
        assert!(alerts.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn alert_failure_keeps_incident_and_still_tickets() {
        let store = Arc::new(InMemoryStore::new());
        let alerts = Arc::new(RecordingAlerts {
            fail: true,
            ..Default::default()
        });
        let pipeline = pipeline(store.clone(), alerts, Arc::new(FixedTickets));

        let err = submit(&pipeline, &submission_body()).await.expect_err("partial");
        match err {
            IntakeError::PartialFailure(partial) => {
                assert_eq!(partial.incident_id, 1);
                assert_eq!(partial.failed_steps(), vec!["alert"]);
                assert_eq!(partial.issue_key, Some(TicketKey("SO-1".to_string())));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.get(1).await.is_ok());
    }

    #[tokio::test]
    async fn slow_ticket_call_times_out() {
        let store = Arc::new(InMemoryStore::new());
        let pipeline = pipeline(
            store,
            Arc::new(RecordingAlerts::default()),
            Arc::new(SlowTickets),
        );

        let err = submit(&pipeline, &submission_body()).await.expect_err("timeout");
        let IntakeError::PartialFailure(partial) = err else {
            panic!("expected partial failure");
        };
        assert_eq!(partial.failed_steps(), vec!["ticket"]);
        assert!(matches!(
            partial.failures[0].error,
            DispatchError::Timeout(_)
        ));
        assert!(partial.issue_key.is_none());
    }

    #[tokio::test]
    async fn unconfigured_dispatchers_are_reported() {
        let pipeline = pipeline(
            Arc::new(InMemoryStore::new()),
            Arc::new(DisabledDispatcher::new("opsgenie")),
            Arc::new(DisabledDispatcher::new("jira")),
        );
        let err = submit(&pipeline, &submission_body()).await.expect_err("partial");
        assert_eq!(
            err.to_string(),
            "incident 1 was recorded but alert and ticket failed"
        );
    }

    #[tokio::test]
    async fn verification_token_is_checked_when_configured() {
        let store = Arc::new(InMemoryStore::new());
        let pipeline = Arc::new(
            IntakePipeline::new(
                store.clone(),
                Arc::new(RecordingAlerts::default()),
                Arc::new(FixedTickets),
                Arc::new(RecordingOpener::default()),
                SignatureVerifier::new(SECRET, None),
            )
            .with_verification_token(Some("expected".to_string())),
        );
        let err = submit(&pipeline, &submission_body()).await.expect_err("token");
        assert!(matches!(err, IntakeError::InvalidToken));
        assert!(store.list(10).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn validation_errors_are_not_decode_errors() {
        let pipeline = pipeline(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingAlerts::default()),
            Arc::new(FixedTickets),
        );
        let mut payload = submission();
        payload["view"]["state"]["values"]["end_time"]["end_time_action"]["selected_date"] =
            serde_json::json!("2023-12-31");
        let err = submit(&pipeline, &form(&payload)).await.expect_err("invalid");
        assert!(matches!(
            err,
            IntakeError::Validation(ValidationError::EndBeforeStart)
        ));
    }

    #[tokio::test]
    async fn challenge_is_echoed_after_verification() {
        let pipeline = pipeline(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingAlerts::default()),
            Arc::new(FixedTickets),
        );
        let body = br#"{"type":"url_verification","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"}"#;
        let (ts, sig) = signed(body);
        let outcome = pipeline
            .handle_interaction(
                Some("application/json"),
                body,
                RequestAuth {
                    timestamp: Some(&ts),
                    signature: Some(&sig),
                },
                NOW,
            )
            .await
            .expect("challenge");
        assert!(matches!(
            outcome,
            InteractionOutcome::Challenge(ref value)
                if value == "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        ));
    }

    #[tokio::test]
    async fn create_incident_command_opens_modal() {
        let opener = Arc::new(RecordingOpener::default());
        let pipeline = IntakePipeline::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingAlerts::default()),
            Arc::new(FixedTickets),
            opener.clone(),
            SignatureVerifier::new(SECRET, None),
        );
        let body = b"command=%2Fcreate-incident&trigger_id=trig-1";
        let (ts, sig) = signed(body);
        let auth = RequestAuth {
            timestamp: Some(&ts),
            signature: Some(&sig),
        };
        pipeline
            .handle_command(body, auth, NOW)
            .await
            .expect("opened");
        assert_eq!(*opener.triggers.lock().unwrap(), vec!["trig-1".to_string()]);

        let body = b"command=%2Fweather&trigger_id=trig-2";
        let (ts, sig) = signed(body);
        let err = pipeline
            .handle_command(
                body,
                RequestAuth {
                    timestamp: Some(&ts),
                    signature: Some(&sig),
                },
                NOW,
            )
            .await
            .expect_err("unknown");
        assert!(err.is_not_found());
    }

    async fn assert_store_failure_dispatches_nothing(hangs: bool) {
        let alerts = Arc::new(RecordingAlerts::default());
        let tickets = Arc::new(RecordingTickets::default());
        let store = Arc::new(BrokenStore { hangs });
        let pipeline = pipeline(store, alerts.clone(), tickets.clone());

        let body = submission_body();
        let err = tokio::time::timeout(Duration::from_secs(2), submit(&pipeline, &body))
            .await
            .expect("store write is bounded")
            .expect_err("store failure");
        assert!(matches!(err, IntakeError::Store(StoreError::Unexpected(_))));
        assert!(alerts.sent.lock().unwrap().is_empty());
        assert!(tickets.opened.lock().unwrap().is_empty());

        let api = crate::api::error::ApiError::from(err);
        assert_eq!(api.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.code, "internal");
    }

    #[tokio::test]
    async fn store_failure_is_internal_and_dispatches_nothing() {
        assert_store_failure_dispatches_nothing(false).await;
    }

    #[tokio::test]
    async fn stalled_store_write_times_out() {
        assert_store_failure_dispatches_nothing(true).await;
    }
}

