use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::app::state::{LibraryHandle, ReloadOutcome};
use crate::dashboard::{ChartView, DashboardConfig, render_dashboard};
use crate::dataset::{LoadOptions, Library};
use crate::filter::{SelectionEvent, SelectionView, select};
use crate::normalize::MAX_RATING;
use crate::shelf::{ShelfView, build_shelf};

#[derive(Clone)]
pub struct AppState {
    pub library: LibraryHandle,
    pub dashboard: Arc<DashboardConfig>,
    pub location: Arc<str>,
    pub load_options: LoadOptions,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unavailable(message: String) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message,
        }
    }

    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/status", get(status))
        .route("/api/charts", get(list_charts))
        .route("/api/charts/:id", get(get_chart))
        .route("/api/select", get(select_books))
        .route("/api/shelf", get(shelf))
        .route("/api/reload", post(reload))
        .fallback(|| async {
            Html(
                r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>bookstats</title></head>
  <body>
    <h1>bookstats</h1>
    <p>Chart data lives under <code>/api/charts</code>; the bookshelf under <code>/api/shelf</code>.</p>
  </body>
</html>
"#,
            )
        })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn snapshot(state: &AppState) -> Result<Arc<Library>, ApiError> {
    state.library.snapshot().await.map_err(ApiError::unavailable)
}

#[derive(Debug, Serialize)]
struct StatusView {
    source: String,
    books: usize,
    loaded_at: String,
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusView>, ApiError> {
    let library = snapshot(&state).await?;
    Ok(Json(StatusView {
        source: library.source.clone(),
        books: library.books.len(),
        loaded_at: library.loaded_at.to_rfc3339(),
    }))
}

async fn list_charts(State(state): State<AppState>) -> Result<Json<Vec<ChartView>>, ApiError> {
    let library = snapshot(&state).await?;
    Ok(Json(render_dashboard(&library, &state.dashboard)))
}

fn find_chart(library: &Library, dashboard: &DashboardConfig, id: &str) -> Result<ChartView, ApiError> {
    render_dashboard(library, dashboard)
        .into_iter()
        .find(|chart| chart.id == id)
        .ok_or_else(|| ApiError::not_found(format!("chart not found: {id}")))
}

async fn get_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChartView>, ApiError> {
    let library = snapshot(&state).await?;
    find_chart(&library, &state.dashboard, &id).map(Json)
}

async fn select_books(
    State(state): State<AppState>,
    event: Result<Query<SelectionEvent>, QueryRejection>,
) -> Result<Json<SelectionView>, ApiError> {
    let Query(event) = event?;
    let library = snapshot(&state).await?;
    let chart = find_chart(&library, &state.dashboard, &event.chart)?;
    Ok(Json(select(
        &library.books,
        &chart.series,
        &event.label,
        &state.dashboard.default_cover_url,
    )))
}

#[derive(Debug, Deserialize)]
struct ShelfQuery {
    min_rating: Option<u8>,
}

async fn shelf(
    State(state): State<AppState>,
    query: Result<Query<ShelfQuery>, QueryRejection>,
) -> Result<Json<ShelfView>, ApiError> {
    let Query(query) = query?;
    if let Some(min_rating) = query.min_rating
        && min_rating > MAX_RATING
    {
        return Err(ApiError::bad_request(format!(
            "min_rating must be between 0 and {MAX_RATING}: {min_rating}"
        )));
    }
    let library = snapshot(&state).await?;
    Ok(Json(build_shelf(
        &library.books,
        query.min_rating,
        &state.dashboard.default_cover_url,
    )))
}

async fn reload(State(state): State<AppState>) -> Response {
    match state
        .library
        .reload(&state.location, &state.load_options)
        .await
    {
        ReloadOutcome::Applied { books } => {
            Json(serde_json::json!({ "status": "applied", "books": books })).into_response()
        }
        ReloadOutcome::Stale => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "status": "superseded" })),
        )
            .into_response(),
        ReloadOutcome::Failed { message } => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "status": "failed", "error": message })),
        )
            .into_response(),
    }
}
