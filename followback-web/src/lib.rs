//! HTTP front end: a form page and a single reconciliation endpoint.
//!
//! `POST /manage_followers` takes a `username` form field and answers with
//! `{"not_following_back": [...], "not_followed_back": [...]}`. The GitHub
//! token comes from server configuration; without one every request is
//! rejected with `400` before any upstream call.
pub mod error;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use error::ApiError;
use followback_common::FollowbackError;
use followback_config::GithubSettings;
use followback_social::github::{GithubApi, is_valid_login};
use followback_social::{DifferenceResult, FollowGraph, GraphError};
use serde::Deserialize;
use std::net::SocketAddr;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared handler state. The GitHub client is built once so every request
/// reuses its connection pool.
#[derive(Clone)]
pub struct AppState {
    api: Option<GithubApi>,
}

impl AppState {
    /// Fails only when `api_base` is not a usable URL. A missing token is
    /// not an error here; requests are rejected instead.
    pub fn new(github: &GithubSettings) -> Result<Self, GraphError> {
        let api = match github.token() {
            Some(token) => Some(
                GithubApi::new(&github.api_base, Some(token.to_string()))?
                    .with_per_page(github.page_size())
                    .with_timeout(github.timeout()),
            ),
            None => None,
        };
        Ok(Self { api })
    }

    fn api(&self) -> Result<GithubApi, ApiError> {
        self.api.clone().ok_or_else(|| {
            FollowbackError::Config("GitHub token not configured (set GITHUB_TOKEN)".into()).into()
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ManageForm {
    #[serde(default)]
    pub username: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/manage_followers", post(manage_followers))
        .with_state(state)
}

async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn manage_followers(
    State(state): State<AppState>,
    form: Result<Form<ManageForm>, FormRejection>,
) -> Result<Json<DifferenceResult>, ApiError> {
    let Form(form) = form?;
    let api = state.api()?;

    let username = form.username.trim();
    if !is_valid_login(username) {
        return Err(ApiError::InvalidUsername);
    }

    let diff = api.differences(username).await?;
    Ok(Json(diff))
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}
