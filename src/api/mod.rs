mod handlers;
mod pages;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::store::TaskStore;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub config: Arc<AppConfig>,
    /// Pins "today" for scheduling. `None` follows the local clock.
    fixed_date: Option<NaiveDate>,
}

impl AppState {
    pub fn new(store: TaskStore, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            fixed_date: None,
        }
    }

    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl FromRef<AppState> for TaskStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Tasks
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        // Scheduling
        .route("/schedule", post(handlers::schedule))
        .route("/schedule/days", post(handlers::schedule_days))
        // Health
        .route("/health", get(handlers::health));

    let ui = Router::new()
        .route("/", get(pages::index))
        .route("/add", post(pages::add_task))
        .route("/remove/{id}", post(pages::remove_task))
        .route("/schedule", post(pages::schedule))
        .route("/export/tasks.csv", get(pages::export_tasks))
        .route("/export/schedule.csv", get(pages::export_schedule));

    ui.nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
