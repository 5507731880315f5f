use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use nmv_collect::scheduler::CLIENT_COLLECTION_JOB;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn ready(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.list_active_switches().await?;
    Ok(StatusCode::OK)
}

// ── Scheduler status ──────────────────────────────────────────────────────────

pub async fn list_jobs(State(state): State<AppState>) -> Json<Value> {
    let jobs = state.scheduler.jobs().await;
    Json(json!(jobs))
}

// ── Manual collection trigger ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CollectQuery {
    pub maintenance_id: String,
    pub source: Option<String>,
}

pub async fn trigger_collect(
    State(state): State<AppState>,
    Path(api_name): Path<String>,
    Query(query): Query<CollectQuery>,
) -> Result<Json<Value>, ApiError> {
    let report = if api_name == CLIENT_COLLECTION_JOB {
        state
            .client
            .collect_client_data(&query.maintenance_id, query.source.as_deref())
            .await?
    } else {
        state
            .indicator
            .collect(&api_name, query.source.as_deref(), &query.maintenance_id)
            .await?
    };
    Ok(Json(json!(report)))
}

// ── Collection health ─────────────────────────────────────────────────────────

pub async fn list_errors(
    State(state): State<AppState>,
    Path(maintenance_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let errors = state.store.list_collection_errors(&maintenance_id).await?;
    Ok(Json(json!(errors)))
}

pub async fn latest_batch(
    State(state): State<AppState>,
    Path((maintenance_id, api_name, hostname)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let batch = state
        .store
        .latest_batch(&api_name, &hostname, &maintenance_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("no batch for {api_name}/{hostname}/{maintenance_id}"))
        })?;
    let items = state.store.batch_items(batch.id).await?;
    Ok(Json(json!({ "batch": batch, "items": items })))
}
