//! HTTP front end for the history page

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;

use crate::controller::{Controller, LoadOutcome, Trigger};
use crate::html::render_page;
use crate::page::Page;
use crate::render::TableModel;
use crate::ViewerError;

type AppState = Arc<Controller<Page>>;

/// Build the page router
pub fn build_router(controller: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/select", post(select))
        .route("/range", post(set_range))
        .route("/refresh", post(refresh))
        .route("/current", post(load_current))
        .route("/api/table", get(get_table))
        .route("/api/load", post(run_load))
        .route("/health", get(health))
        .with_state(controller)
}

#[derive(Debug)]
pub enum ApiError {
    PageClosed,
    NoTable,
    Internal(String),
}

impl From<ViewerError> for ApiError {
    fn from(value: ViewerError) -> Self {
        match value {
            ViewerError::PageClosed => Self::PageClosed,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageClosed => ViewerError::PageClosed.fmt(f),
            Self::NoTable => write!(f, "No table loaded yet"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::PageClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::NoTable => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
struct SelectForm {
    service: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RangeForm {
    min_tick: String,
    max_tick: String,
}

#[derive(Deserialize)]
struct LoadRequest {
    trigger: Trigger,
}

async fn index(State(controller): State<AppState>) -> Result<Html<String>, ApiError> {
    let html = controller.page().inspect(render_page).await?;
    Ok(Html(html))
}

async fn select(State(controller): State<AppState>, Form(form): Form<SelectForm>) -> Redirect {
    controller.select(form.service).await;
    Redirect::to("/")
}

async fn set_range(State(controller): State<AppState>, Form(form): Form<RangeForm>) -> Redirect {
    controller.set_range(form.min_tick, form.max_tick).await;
    Redirect::to("/")
}

async fn refresh(State(controller): State<AppState>) -> Redirect {
    controller.load(Trigger::Refresh).await;
    Redirect::to("/")
}

async fn load_current(State(controller): State<AppState>) -> Redirect {
    controller.load(Trigger::LoadCurrent).await;
    Redirect::to("/")
}

async fn get_table(State(controller): State<AppState>) -> Result<Json<TableModel>, ApiError> {
    let table = controller
        .page()
        .inspect(|page: &Page| page.table.clone())
        .await?;
    table.map(Json).ok_or(ApiError::NoTable)
}

async fn run_load(
    State(controller): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> Json<LoadOutcome> {
    Json(controller.load(request.trigger).await)
}

async fn health() -> impl IntoResponse {
    "OK"
}
