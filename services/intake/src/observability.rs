//! Observability wiring for the intake service.
//!
//! # Purpose
//! Initializes tracing with optional OTLP export, extracts W3C trace context
//! from inbound Slack requests, and owns the service's Prometheus metrics:
//! webhook outcomes, downstream call outcomes and the stored incident gauge.
//!
//! # Notes
//! Each webhook request runs inside an `intake` span whose `stage` and
//! `incident_id` fields are filled in as the submission progresses, so log
//! lines and exported spans can be joined to a stored incident.
//! Initialization is guarded by `OnceLock` to keep startup idempotent in tests.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::Span;
use tracing::field::Empty;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const REQUESTS_TOTAL: &str = "incident_intake_requests_total";
pub const DISPATCH_TOTAL: &str = "incident_intake_dispatch_total";
pub const STORED_INCIDENTS: &str = "incident_intake_incidents";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static OBS_INIT: OnceLock<()> = OnceLock::new();
static PROPAGATOR_INIT: OnceLock<()> = OnceLock::new();

pub fn init_observability(service_name: &str) -> PrometheusHandle {
    OBS_INIT.get_or_init(|| {
        install_propagator();

        let provider = build_tracer_provider(service_name);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer());
        if let Some(provider) = provider {
            let tracer = provider.tracer(service_name.to_string());
            let _ = registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init();
        } else {
            let _ = registry.try_init();
        }
    });

    METRICS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("install metrics recorder");
            describe_metrics();
            handle
        })
        .clone()
}

fn describe_metrics() {
    metrics::describe_counter!(
        REQUESTS_TOTAL,
        "Slack webhook requests by endpoint and outcome"
    );
    metrics::describe_counter!(
        DISPATCH_TOTAL,
        "Downstream alert, ticket and modal calls by target and outcome"
    );
    metrics::describe_gauge!(STORED_INCIDENTS, "Incidents currently held by the store");
}

/// Count one webhook request by endpoint and outcome.
pub fn record_request(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

/// Count one downstream call (alert, ticket, modal) by outcome.
pub fn record_dispatch(target: &'static str, outcome: &'static str) {
    metrics::counter!(DISPATCH_TOTAL, "target" => target, "outcome" => outcome).increment(1);
}

pub fn record_stored_incidents(count: u64) {
    metrics::gauge!(STORED_INCIDENTS).set(count as f64);
}

/// Span covering one Slack webhook request.
pub fn intake_span(endpoint: &'static str) -> Span {
    tracing::info_span!("intake", endpoint, stage = Empty, incident_id = Empty)
}

/// Mark the current intake span as having reached `stage`.
pub fn record_stage(stage: &'static str) {
    Span::current().record("stage", stage);
}

pub fn record_incident_id(incident_id: i64) {
    Span::current().record("incident_id", incident_id);
}

fn install_propagator() {
    PROPAGATOR_INIT.get_or_init(|| {
        global::set_text_map_propagator(TraceContextPropagator::new());
    });
}

fn build_tracer_provider(
    service_name: &str,
) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name))
        .build();
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    Some(
        opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(service_name: &str) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new("service.name", service_name.to_string())];
    if let Ok(value) =
        std::env::var("INCIDENT_INTAKE_INSTANCE_ID").or_else(|_| std::env::var("HOSTNAME"))
    {
        attrs.push(KeyValue::new("service.instance.id", value));
    }
    if let Ok(value) = std::env::var("DEPLOYMENT_ENVIRONMENT") {
        attrs.push(KeyValue::new("deployment.environment", value));
    }
    attrs
}

/// Parent context propagated by an upstream proxy in `traceparent` headers.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|prop| prop.extract(&HeaderMapExtractor(headers)))
}

struct HeaderMapExtractor<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_metrics_with_listener(handle, listener, std::future::pending()).await
}

async fn serve_metrics_with_listener<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    );
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}
