use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::models::*;
use crate::scheduler;
use crate::store::TaskStore;

// ============================================================
// Error Handling
// ============================================================

/// Map an error to a response.
///
/// Validation errors carry a message meant for the user and become 400s.
/// Anything else is logged in full and the client only sees a generic 500.
pub(super) fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(invalid) = e.downcast_ref::<ValidationError>() {
        tracing::warn!("Validation error: {}", invalid);
        return (StatusCode::BAD_REQUEST, invalid.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn bad_request(e: ValidationError) -> (StatusCode, String) {
    internal_error(e.into())
}

/// Resolve request parameters against the configured defaults.
pub(super) fn schedule_options(
    state: &AppState,
    params: ScheduleParams,
    date: Option<NaiveDate>,
) -> Result<ScheduleOptions, ValidationError> {
    let params = params.or(&state.config.schedule_defaults());
    ScheduleOptions::from_params(date.unwrap_or_else(|| state.today()), &params)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(
    State(store): State<TaskStore>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    store.list_tasks().map(Json).map_err(internal_error)
}

pub async fn get_task(
    State(store): State<TaskStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, (StatusCode, String)> {
    store
        .get_task(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))
}

pub async fn create_task(
    State(store): State<TaskStore>,
    Json(input): Json<CreateTaskInput>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    store
        .create_task(input)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(internal_error)
}

pub async fn update_task(
    State(store): State<TaskStore>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    store
        .update_task(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Task not found".to_string()))
}

pub async fn delete_task(
    State(store): State<TaskStore>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if store.delete_task(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Task not found".to_string()))
    }
}

// ============================================================
// Scheduling
// ============================================================

/// Body for the scheduling endpoints. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequest {
    #[serde(flatten)]
    pub params: ScheduleParams,
    /// Day to plan. Defaults to today.
    pub date: Option<NaiveDate>,
    /// Number of days for `/schedule/days`.
    pub days: Option<u32>,
}

pub async fn schedule(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Schedule>, (StatusCode, String)> {
    let options = schedule_options(&state, request.params, request.date).map_err(bad_request)?;
    let tasks = state.store.list_tasks().map_err(internal_error)?;

    let plan = scheduler::schedule_day(&tasks, &options);
    tracing::debug!(
        date = %plan.date,
        slots = plan.slots.len(),
        unscheduled = plan.unscheduled.len(),
        "Built schedule"
    );
    Ok(Json(plan))
}

pub async fn schedule_days(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Vec<Schedule>>, (StatusCode, String)> {
    let days = validate_plan_days(request.days.unwrap_or(DEFAULT_PLAN_DAYS)).map_err(bad_request)?;
    let options = schedule_options(&state, request.params, request.date).map_err(bad_request)?;
    let tasks = state.store.list_tasks().map_err(internal_error)?;

    Ok(Json(scheduler::schedule_days(&tasks, &options, days)))
}
