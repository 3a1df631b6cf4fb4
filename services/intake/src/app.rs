//! Intake HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::pipeline::IntakePipeline;
use crate::store::IncidentStore;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncidentStore>,
    pub intake: Arc<IntakePipeline>,
}

impl AppState {
    /// State whose read endpoints share the pipeline's store.
    pub fn new(intake: IntakePipeline) -> Self {
        Self {
            store: Arc::clone(intake.store()),
            intake: Arc::new(intake),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/slack/commands",
            axum::routing::post(api::slack::slash_command),
        )
        .route(
            "/slack/interactions",
            axum::routing::post(api::slack::interaction),
        )
        .route(
            "/v1/incidents",
            axum::routing::get(api::incidents::list_incidents),
        )
        .route(
            "/v1/incidents/:incident_id",
            axum::routing::get(api::incidents::get_incident),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
