use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, Utc};
use ledger_analytics::{cumulative, DailyWindow, GroupSort};
use ledger_core::filter::SessionFilter;
use ledger_core::types::{NewSession, SessionPatch};
use serde::Deserialize;

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

// ── Lookups ─────────────────────────────────────────────────────────────

pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees))
        .route("/machines", get(list_machines))
}

async fn list_employees(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.lookups.employees().to_vec())
}

async fn list_machines(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.lookups.machines().to_vec())
}

// ── Sessions ────────────────────────────────────────────────────────────

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/view", get(list_session_views))
        .route(
            "/sessions/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}

async fn list_sessions(
    State(state): State<AppState>,
    filter: Result<Query<SessionFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = filter?;
    let sessions = state.store.read().await.list();
    let sessions = filter.apply(sessions, state.aggregator.offset());
    tracing::debug!("Listing {} sessions", sessions.len());
    Ok(Json(sessions))
}

/// Sessions joined with employee and machine names, newest first.
async fn list_session_views(
    State(state): State<AppState>,
    filter: Result<Query<SessionFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(filter) = filter?;
    let sessions = filter.apply(state.store.read().await.list(), state.aggregator.offset());
    let mut views = state.lookups.resolve_all(&sessions);
    views.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(views))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.store.read().await.get(&id)?;
    Ok(Json(session))
}

async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<NewSession>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(data) = payload?;
    let session = state.store.write().await.create(data)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SessionPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut store = state.store.write().await;
    // Unknown ids are reported before body problems.
    store.get(&id)?;
    let Json(patch) = payload?;
    let session = store.update(&id, patch)?;
    Ok(Json(session))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.write().await.delete(&id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// ── Stats ───────────────────────────────────────────────────────────────

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats/overview", get(overview))
        .route("/stats/employees", get(employee_stats))
        .route("/stats/machines", get(machine_stats))
        .route("/stats/monthly", get(monthly_stats))
        .route("/stats/daily", get(daily_stats))
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    #[serde(default)]
    sort: Option<String>,
}

impl GroupQuery {
    fn sort_or(&self, default: GroupSort) -> Result<GroupSort, ApiError> {
        match &self.sort {
            Some(key) => key.parse().map_err(ApiError::InvalidParam),
            None => Ok(default),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    #[serde(default)]
    range: Option<String>,
    #[serde(default)]
    fill: bool,
    #[serde(default)]
    cumulative: bool,
}

async fn overview(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.store.read().await.list();
    Json(state.aggregator.overview(&sessions))
}

async fn employee_stats(
    State(state): State<AppState>,
    query: Result<Query<GroupQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let sort = query.sort_or(GroupSort::FirstSeen)?;
    let sessions = state.store.read().await.list();
    Ok(Json(state.aggregator.by_employee(&sessions, &state.lookups, sort)))
}

async fn machine_stats(
    State(state): State<AppState>,
    query: Result<Query<GroupQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let sort = query.sort_or(GroupSort::Profit)?;
    let sessions = state.store.read().await.list();
    Ok(Json(state.aggregator.by_machine(&sessions, &state.lookups, sort)))
}

async fn monthly_stats(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.store.read().await.list();
    Json(state.aggregator.monthly_series(&sessions))
}

async fn daily_stats(
    State(state): State<AppState>,
    query: Result<Query<DailyQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let window = match &query.range {
        Some(range) => range.parse::<DailyWindow>().map_err(ApiError::InvalidParam)?,
        None => DailyWindow::All,
    };
    let today = local_today(&state);
    let sessions = state.store.read().await.list();

    let series = if query.fill {
        state.aggregator.daily_profit_filled(&sessions, window, today)
    } else {
        state.aggregator.daily_profit(&sessions, window, today)
    };
    let series = if query.cumulative {
        cumulative(&series)
    } else {
        series
    };
    Ok(Json(series))
}

fn local_today(state: &AppState) -> NaiveDate {
    Utc::now()
        .with_timezone(&state.aggregator.offset())
        .date_naive()
}
