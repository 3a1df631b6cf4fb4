//! Incident read API handlers.
//!
//! # Purpose and responsibility
//! Lets operators look up incidents recorded through Slack, including ones
//! whose downstream dispatch failed.
use crate::api::error::{ApiError, api_internal, api_not_found, api_validation_error};
use crate::api::types::IncidentListResponse;
use crate::app::AppState;
use crate::model::IncidentRecord;
use crate::store::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, StoreError};
use axum::Json;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/incidents",
    tag = "incidents",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum incidents to return, newest first")
    ),
    responses(
        (status = 200, description = "Recent incidents", body = IncidentListResponse),
        (status = 400, description = "Invalid limit", body = crate::api::types::ErrorResponse)
    )
)]
/// List the most recent incidents.
///
/// # Errors
/// - Returns 400 if `limit` is not a positive integer.
/// - Returns 500 if the store cannot be read.
pub(crate) async fn list_incidents(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<IncidentListResponse>, ApiError> {
    let limit = match params.get("limit") {
        None => DEFAULT_LIST_LIMIT,
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) if value > 0 => value.min(MAX_LIST_LIMIT),
            _ => return Err(api_validation_error("limit must be a positive integer")),
        },
    };
    let items = state
        .store
        .list(limit)
        .await
        .map_err(|err| api_internal("failed to list incidents", &err))?;
    Ok(Json(IncidentListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/incidents/{incident_id}",
    tag = "incidents",
    params(
        ("incident_id" = i64, Path, description = "Incident identifier")
    ),
    responses(
        (status = 200, description = "Fetch incident", body = IncidentRecord),
        (status = 404, description = "Incident not found", body = crate::api::types::ErrorResponse)
    )
)]
/// Fetch one incident by id.
pub(crate) async fn get_incident(
    Path(incident_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<IncidentRecord>, ApiError> {
    match state.store.get(incident_id).await {
        Ok(record) => Ok(Json(record)),
        Err(StoreError::NotFound(_)) => Err(api_not_found("incident not found")),
        Err(err) => Err(api_internal("failed to load incident", &err)),
    }
}
