//! HTTP handlers for the run ledger
//!
//! - `GET /healthz`
//! - `POST /runs` with optional `{ settings }`, 201 + run
//! - `GET /runs/:run_id`, 200 + run or 404
//! - `PATCH /runs/:run_id/stages`, 200 + run or 400 on a missing stage or
//!   rejected advance
//!
//! Store calls do blocking file I/O and run on the blocking pool.

use crate::api_errors::ApiError;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use passprep_core::{CourseState, Settings};
use passprep_run::{
    AdvanceParams, Audit, PipelineStage, RunRecord, RunStore, StageError, StageStatus, StoreError,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Shared handler state
#[derive(Clone, Debug)]
pub struct AppState {
    store: Arc<RunStore>,
}

impl AppState {
    pub fn new(store: RunStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateRunRequest {
    #[serde(default)]
    settings: Option<Settings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceStageRequest {
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    status: Option<StageStatus>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<StageError>,
    #[serde(default)]
    audit: Option<Audit>,
    #[serde(default)]
    settings: Option<Settings>,
    #[serde(default)]
    course_state: Option<CourseState>,
    #[serde(default)]
    artifacts: Option<Map<String, Value>>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/runs", post(create_run))
        .route("/runs/:run_id", get(get_run))
        .route("/runs/:run_id/stages", patch(advance_stage))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// An unreadable body creates a run without settings.
async fn create_run(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<RunRecord>), ApiError> {
    let request: CreateRunRequest = serde_json::from_slice(&body).unwrap_or_default();
    let run = with_store(&state, move |store| store.create_run(request.settings)).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, ApiError> {
    let run = with_store(&state, move |store| store.get_run(&run_id)).await?;
    run.map(Json)
        .ok_or_else(|| ApiError::not_found("Run not found"))
}

async fn advance_stage(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    body: Bytes,
) -> Result<Json<RunRecord>, ApiError> {
    let request: AdvanceStageRequest = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("invalid request body: {err}")))?;

    let stage: PipelineStage = request
        .stage
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("stage is required"))?
        .parse()
        .map_err(|err: passprep_run::UnknownStage| ApiError::bad_request(err.to_string()))?;

    let params = AdvanceParams {
        run_id,
        stage,
        status: request.status,
        message: request.message,
        error: request.error,
        audit: request.audit,
        settings: request.settings,
        course_state: request.course_state,
        artifacts: request.artifacts,
    };
    let run = with_store(&state, move |store| store.advance_run_stage(params)).await?;
    Ok(Json(run))
}

async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&RunStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|err| ApiError::internal(format!("store task failed: {err}")))?
        .map_err(ApiError::from)
}
