use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;
use tracing::warn;

use crate::api::rest::surface;
use crate::backend::payloads::{Credentials, RegisterPayload};
use crate::error::AppError;
use crate::forms::{LoginForm, RegisterForm};
use crate::preferences::RememberMe;
use crate::session::SessionView;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(current_session))
        .route("/session/login", post(login))
        .route("/session/register", post(register))
        .route("/session/logout", post(logout))
        .route("/session/remember-me", get(get_remember_me).put(put_remember_me))
}

async fn current_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>, AppError> {
    let user = state.current_user().await?;
    Ok(Json(SessionView::for_user(&user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionView>, AppError> {
    form.validate()?;

    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };
    let auth = surface(&state, "Sign in", state.backend.login(&credentials).await)?;

    let prefs = RememberMe {
        remember_me: form.remember_me,
        email: form.remember_me.then(|| credentials.email.clone()),
    };
    if let Err(err) = state.preferences.save(&prefs).await {
        warn!(error = %err, "failed to store remember-me preference");
    }

    Ok(Json(SessionView::for_user(&auth.user)))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RegisterForm>,
) -> Result<Json<SessionView>, AppError> {
    let role = form.validate()?;

    let payload = RegisterPayload {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        password: form.password.clone(),
        role,
    };
    let auth = surface(&state, "Registration", state.backend.register(&payload).await)?;

    state.notifier.success("Account created");
    Ok(Json(SessionView::for_user(&auth.user)))
}

#[derive(Serialize)]
struct LogoutResponse {
    status: &'static str,
}

/// Always ends the local session, even when the backend cannot be reached.
async fn logout(State(state): State<Arc<AppState>>) -> Json<LogoutResponse> {
    state.availability.shutdown().await;

    if let Err(err) = state.backend.logout().await {
        warn!(error = %err, "backend logout failed; local session cleared anyway");
    }

    Json(LogoutResponse {
        status: "signed_out",
    })
}

async fn get_remember_me(State(state): State<Arc<AppState>>) -> Json<RememberMe> {
    Json(state.preferences.load().await)
}

async fn put_remember_me(
    State(state): State<Arc<AppState>>,
    Json(prefs): Json<RememberMe>,
) -> Result<Json<RememberMe>, AppError> {
    state.preferences.save(&prefs).await?;
    Ok(Json(state.preferences.load().await))
}
