//! Incident intake HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, downstream clients and HTTP routers, then
//! serves the API until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use incident_intake::app::{AppState, build_router};
use incident_intake::auth::signature::SignatureVerifier;
use incident_intake::config::{self, IntakeConfig};
use incident_intake::dispatch::jira::JiraTickets;
use incident_intake::dispatch::opsgenie::OpsgenieAlerts;
use incident_intake::dispatch::slack::SlackModalOpener;
use incident_intake::dispatch::{
    AlertDispatcher, DisabledDispatcher, ModalOpener, TicketDispatcher,
};
use incident_intake::observability;
use incident_intake::pipeline::IntakePipeline;
use incident_intake::store::IncidentStore;
use incident_intake::store::{memory::InMemoryStore, postgres::PostgresStore};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = IntakeConfig::from_env_or_yaml().context("load intake config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: IntakeConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("incident-intake");
    let state = build_state(config.clone()).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());

    let addr = config.bind_addr;
    tracing::info!(%addr, backend = state.store.backend_name(), "incident intake listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: IntakeConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn IncidentStore> = match config.storage {
        config::StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        config::StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };

    let client = reqwest::Client::builder()
        .timeout(config.dispatch_timeout())
        .build()
        .context("build http client")?;

    let alerts: Arc<dyn AlertDispatcher> = match config.opsgenie.settings() {
        Some(settings) => Arc::new(OpsgenieAlerts::new(client.clone(), settings)),
        None => {
            tracing::warn!("OPSGENIE_API_KEY not set; alerts will be reported as failed");
            Arc::new(DisabledDispatcher::new("opsgenie"))
        }
    };
    let tickets: Arc<dyn TicketDispatcher> = match config.jira.settings() {
        Some(settings) => Arc::new(JiraTickets::new(client.clone(), settings)),
        None => {
            tracing::warn!("jira credentials not set; tickets will be reported as failed");
            Arc::new(DisabledDispatcher::new("jira"))
        }
    };
    let modal_opener: Arc<dyn ModalOpener> = match &config.slack.bot_token {
        Some(token) => Arc::new(
            SlackModalOpener::new(client.clone(), &config.slack.api_base, token.expose())
                .context("load incident form view")?,
        ),
        None => {
            tracing::warn!("SLACK_BOT_TOKEN not set; the incident form cannot be opened");
            Arc::new(DisabledDispatcher::new("slack"))
        }
    };

    let verifier = SignatureVerifier::new(
        config.slack.signing_secret.expose(),
        config.max_timestamp_age(),
    );
    let pipeline = IntakePipeline::new(store, alerts, tickets, modal_opener, verifier)
        .with_verification_token(
            config
                .slack
                .verification_token
                .as_ref()
                .map(|token| token.expose().to_string()),
        )
        .with_dispatch_timeout(config.dispatch_timeout());

    Ok(AppState::new(pipeline))
}
