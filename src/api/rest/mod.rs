pub mod admin;
pub mod driver;
pub mod rider;
pub mod rides;
pub mod session;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::error::AppResult;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(session::router())
        .merge(driver::router())
        .merge(rider::router())
        .merge(admin::router())
        .merge(rides::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .fallback_service(ServeDir::new("static"))
}

/// A derived list as a page shows it.
#[derive(Debug, Serialize)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub total: usize,
    /// Placeholder text, set only when `items` is empty.
    pub empty_message: Option<&'static str>,
}

impl<T> ListView<T> {
    pub fn new(items: Vec<T>, empty_message: &'static str) -> Self {
        let total = items.len();
        Self {
            empty_message: items.is_empty().then_some(empty_message),
            items,
            total,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Reports a failed user action on the notification stream before handing
/// the error back to the caller.
pub(crate) fn surface<T>(state: &AppState, action: &str, result: AppResult<T>) -> AppResult<T> {
    if let Err(err) = &result {
        state.notifier.failure(action, err);
    }
    result
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    signed_in: bool,
    cache_entries: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        signed_in: state.backend.has_token().await,
        cache_entries: state.backend.cache().len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
