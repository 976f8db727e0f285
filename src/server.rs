//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ranked_stories` | Rank the top stories against `{"bio": "..."}` |
//! | `GET`  | `/stories` | Cached top stories in feed order |
//! | `GET`  | `/health` | Health check with cache status |
//! | `GET`  | `/` | Interactive ranking form |
//! | `POST` | `/` | Form submission (`application/x-www-form-urlencoded`) |
//!
//! # Error Contract
//!
//! JSON endpoints answer errors with a flat body:
//!
//! ```json
//! { "error": "User bio must contain at least one alphanumeric character." }
//! ```
//!
//! `400` for malformed bodies and invalid bios, `500` when the embedding
//! provider fails. Failing to reach the item store is not an error: the
//! endpoint ranks whatever is cached, possibly nothing.

use anyhow::Context;
use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::form::{render_page, FormOutcome};
use crate::models::Story;
use crate::service::{RankError, StoryRanker};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    ranker: Arc<StoryRanker>,
}

/// Start the server described by `config`.
///
/// Builds the HTTP item source, story cache and embedding provider from the
/// configuration, then serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let ranker = Arc::new(StoryRanker::from_config(config)?);
    run_server_with_ranker(config, ranker).await
}

/// Start the server with a pre-built [`StoryRanker`].
///
/// Binds to `[server].bind`. Useful when the item source or embedding
/// provider is not one of the built-in ones.
pub async fn run_server_with_ranker(
    config: &Config,
    ranker: Arc<StoryRanker>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    tracing::info!(
        "Story ranker listening on http://{} (model: {})",
        listener.local_addr()?,
        ranker.embedder().model_name()
    );

    axum::serve(listener, router(ranker)).await?;
    Ok(())
}

/// Build the application router.
pub fn router(ranker: Arc<StoryRanker>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_form_page).post(handle_form_submit))
        .route("/ranked_stories", post(handle_ranked_stories))
        .route("/stories", get(handle_stories))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { ranker })
}

// ============ Error response ============

/// JSON error body: `{"error": "..."}`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<RankError> for AppError {
    fn from(err: RankError) -> Self {
        match err {
            RankError::InvalidBio(e) => AppError::bad_request(e.to_string()),
            RankError::Embedding(_) => {
                tracing::error!("{}", err);
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// ============ POST /ranked_stories ============

#[derive(Deserialize)]
struct RankRequest {
    #[serde(default)]
    bio: Option<String>,
}

async fn handle_ranked_stories(
    State(state): State<AppState>,
    payload: Result<Json<RankRequest>, JsonRejection>,
) -> Result<Json<Vec<Story>>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let bio = request.bio.unwrap_or_default();

    let ranked = state.ranker.ranked_for_bio(&bio).await?;
    Ok(Json(ranked))
}

// ============ GET /stories ============

async fn handle_stories(State(state): State<AppState>) -> Json<Vec<Story>> {
    let stories = state.ranker.top_stories().await;
    Json(stories.as_ref().clone())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    version: String,
    model: String,
    stories: usize,
    refreshed_at: Option<DateTime<Utc>>,
    fresh: bool,
}

/// Reports cache state without triggering a refresh.
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.ranker.cache_status().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.ranker.embedder().model_name().to_string(),
        stories: cache.stories,
        refreshed_at: cache.refreshed_at,
        fresh: cache.fresh,
    })
}

// ============ GET / and POST / ============

#[derive(Deserialize)]
struct FormInput {
    #[serde(default)]
    bio: String,
}

async fn handle_form_page() -> Html<String> {
    Html(render_page("", FormOutcome::Blank))
}

async fn handle_form_submit(
    State(state): State<AppState>,
    input: Result<Form<FormInput>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let bio = match input {
        Ok(Form(input)) => input.bio,
        Err(e) => {
            let message = e.body_text();
            return (
                StatusCode::BAD_REQUEST,
                Html(render_page("", FormOutcome::Error(&message))),
            );
        }
    };

    match state.ranker.ranked_for_bio(&bio).await {
        Ok(ranked) => (
            StatusCode::OK,
            Html(render_page(&bio, FormOutcome::Ranked(&ranked))),
        ),
        Err(err) => {
            let status = match err {
                RankError::InvalidBio(_) => StatusCode::BAD_REQUEST,
                RankError::Embedding(_) => {
                    tracing::error!("{}", err);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let message = err.to_string();
            (status, Html(render_page(&bio, FormOutcome::Error(&message))))
        }
    }
}
