//! Server-rendered HTML pages and CSV downloads.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

use super::handlers::{internal_error, schedule_options};
use super::AppState;
use crate::export;
use crate::models::*;
use crate::scheduler;

type PageResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// View models
// ============================================================

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {
    notice: Option<Notice>,
    tasks: Vec<TaskRow>,
    form: ScheduleFormValues,
    schedule: Option<ScheduleView>,
}

/// One-shot message shown above the page, passed through the redirect URL.
struct Notice {
    message: String,
    level: String,
}

impl Notice {
    fn redirect(message: &str, level: &str) -> Redirect {
        Redirect::to(&format!(
            "/?notice={}&level={}",
            urlencoding::encode(message),
            urlencoding::encode(level)
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    pub level: Option<String>,
}

impl NoticeQuery {
    fn into_notice(self) -> Option<Notice> {
        let message = self.notice.filter(|m| !m.trim().is_empty())?;
        let level = match self.level.as_deref() {
            Some(level @ ("success" | "danger" | "info")) => level.to_string(),
            _ => "info".to_string(),
        };
        Some(Notice { message, level })
    }
}

struct TaskRow {
    id: Uuid,
    title: String,
    minutes: u32,
    impact: String,
    deadline: String,
    notes: String,
    splittable: bool,
    score: String,
}

struct ScheduleFormValues {
    hours: String,
    start: String,
    allow_split: bool,
    urgency_window: u32,
}

struct ScheduleView {
    date: String,
    slots: Vec<SlotRow>,
    unscheduled: Vec<UnscheduledRow>,
    allocated_minutes: u32,
    budget_minutes: u32,
    utilization: String,
    export_query: String,
}

struct SlotRow {
    start: String,
    end: String,
    label: String,
    minutes: u32,
    impact: String,
    deadline: String,
}

struct UnscheduledRow {
    title: String,
    minutes: u32,
    reason: &'static str,
}

fn format_deadline(deadline: Option<chrono::NaiveDate>) -> String {
    deadline
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

impl ScheduleFormValues {
    fn from_params(params: &ScheduleParams) -> Self {
        Self {
            hours: params.hours.unwrap_or(DEFAULT_HOURS).to_string(),
            start: params
                .start
                .clone()
                .unwrap_or_else(|| DEFAULT_START.to_string()),
            allow_split: params.allow_split.unwrap_or(false),
            urgency_window: params.urgency_window.unwrap_or(DEFAULT_URGENCY_WINDOW_DAYS),
        }
    }
}

impl ScheduleView {
    fn new(schedule: &Schedule, options: &ScheduleOptions) -> Self {
        let export_query = format!(
            "budget_minutes={}&start={}&allow_split={}&urgency_window={}",
            options.budget_minutes,
            urlencoding::encode(&options.day_start.format(TIME_FORMAT).to_string()),
            options.allow_split,
            options.urgency_window_days
        );
        Self {
            date: schedule.date.format(DATE_FORMAT).to_string(),
            slots: schedule
                .slots
                .iter()
                .map(|slot| SlotRow {
                    start: slot.start.format(TIME_FORMAT).to_string(),
                    end: slot.end.format(TIME_FORMAT).to_string(),
                    label: slot.label(),
                    minutes: slot.minutes,
                    impact: slot.impact.to_string(),
                    deadline: format_deadline(slot.deadline),
                })
                .collect(),
            unscheduled: schedule
                .unscheduled
                .iter()
                .map(|u| UnscheduledRow {
                    title: u.title.clone(),
                    minutes: u.minutes,
                    reason: u.reason.describe(),
                })
                .collect(),
            allocated_minutes: schedule.allocated_minutes,
            budget_minutes: schedule.budget_minutes,
            utilization: format!("{:.0}%", schedule.utilization_percent()),
            export_query,
        }
    }
}

fn render_index(
    state: &AppState,
    notice: Option<Notice>,
    params: &ScheduleParams,
    schedule: Option<ScheduleView>,
) -> PageResult<Html<String>> {
    let tasks = state.store.list_tasks_by_deadline().map_err(internal_error)?;
    let today = state.today();
    let window = params.urgency_window.unwrap_or(DEFAULT_URGENCY_WINDOW_DAYS);

    let page = IndexPage {
        notice,
        tasks: tasks
            .iter()
            .map(|t| TaskRow {
                id: t.id,
                title: t.title.clone(),
                minutes: t.minutes,
                impact: t.impact.to_string(),
                deadline: format_deadline(t.deadline),
                notes: t.notes.clone(),
                splittable: t.splittable,
                score: format!("{:.3}", scheduler::score(t, today, window)),
            })
            .collect(),
        form: ScheduleFormValues::from_params(params),
        schedule,
    };

    page.render()
        .map(Html)
        .map_err(|e| internal_error(anyhow::Error::new(e)))
}

// ============================================================
// Pages
// ============================================================

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> PageResult<Html<String>> {
    let defaults = state.config.schedule_defaults();
    render_index(&state, query.into_notice(), &defaults, None)
}

/// Fields of the "add task" form. Everything arrives as text.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub title: String,
    pub minutes: String,
    pub impact: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub notes: String,
    /// Checkbox: present when ticked.
    pub splittable: Option<String>,
}

impl TryFrom<TaskForm> for CreateTaskInput {
    type Error = ValidationError;

    fn try_from(form: TaskForm) -> Result<Self, Self::Error> {
        Ok(Self {
            title: form.title,
            minutes: parse_field("Minutes", &form.minutes)?,
            impact: parse_field("Impact", &form.impact)?,
            deadline: Some(form.deadline),
            notes: Some(form.notes),
            splittable: form.splittable.is_some(),
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: raw.to_string(),
    })
}

pub async fn add_task(State(state): State<AppState>, Form(form): Form<TaskForm>) -> Response {
    let input = match CreateTaskInput::try_from(form) {
        Ok(input) => input,
        Err(e) => return Notice::redirect(&e.to_string(), "danger").into_response(),
    };

    match state.store.create_task(input) {
        Ok(task) => {
            Notice::redirect(&format!("Added task: \"{}\"", task.title), "success").into_response()
        }
        Err(e) => match e.downcast_ref::<ValidationError>() {
            Some(invalid) => Notice::redirect(&invalid.to_string(), "danger").into_response(),
            None => internal_error(e).into_response(),
        },
    }
}

pub async fn remove_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.store.delete_task(id) {
        Ok(removed) => {
            let count = usize::from(removed);
            Notice::redirect(&format!("Removed {} task(s).", count), "info").into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

/// Fields of the "build schedule" form.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleForm {
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub start: String,
    /// Checkbox: present when ticked.
    pub allow_split: Option<String>,
    #[serde(default)]
    pub urgency_window: String,
}

impl TryFrom<ScheduleForm> for ScheduleParams {
    type Error = ValidationError;

    fn try_from(form: ScheduleForm) -> Result<Self, Self::Error> {
        let hours = match form.hours.trim() {
            "" => None,
            raw => Some(parse_field("Hours", raw)?),
        };
        let urgency_window = match form.urgency_window.trim() {
            "" => None,
            raw => Some(parse_field("Urgency window", raw)?),
        };
        let start = Some(form.start.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Self {
            hours,
            budget_minutes: None,
            start,
            allow_split: Some(form.allow_split.is_some()),
            urgency_window,
        })
    }
}

pub async fn schedule(
    State(state): State<AppState>,
    Form(form): Form<ScheduleForm>,
) -> PageResult<Response> {
    let params = match ScheduleParams::try_from(form) {
        Ok(params) => params.or(&state.config.schedule_defaults()),
        Err(e) => return Ok(Notice::redirect(&e.to_string(), "danger").into_response()),
    };
    let options = match schedule_options(&state, params.clone(), None) {
        Ok(options) => options,
        Err(e) => return Ok(Notice::redirect(&e.to_string(), "danger").into_response()),
    };

    let tasks = state.store.list_tasks().map_err(internal_error)?;
    let plan = scheduler::schedule_day(&tasks, &options);
    tracing::debug!(
        slots = plan.slots.len(),
        utilization = plan.utilization,
        "Rendered schedule"
    );

    let view = ScheduleView::new(&plan, &options);
    render_index(&state, None, &params, Some(view)).map(IntoResponse::into_response)
}

// ============================================================
// Exports
// ============================================================

fn csv_attachment(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn export_tasks(State(state): State<AppState>) -> PageResult<Response> {
    let tasks = state.store.list_tasks().map_err(internal_error)?;
    let body = export::tasks_csv(&tasks).map_err(internal_error)?;
    Ok(csv_attachment(export::TASKS_FILE_NAME, body))
}

/// Recomputes the schedule from the query string, falling back to the
/// configured defaults for anything left out.
pub async fn export_schedule(
    State(state): State<AppState>,
    Query(params): Query<ScheduleParams>,
) -> PageResult<Response> {
    let options = schedule_options(&state, params, None).map_err(|e| internal_error(e.into()))?;
    let tasks = state.store.list_tasks().map_err(internal_error)?;
    let plan = scheduler::schedule_day(&tasks, &options);

    let body = export::schedule_csv(&plan).map_err(internal_error)?;
    Ok(csv_attachment(&export::schedule_file_name(&plan), body))
}
