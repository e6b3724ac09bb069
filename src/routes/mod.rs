//! HTTP route handlers for the quiz API.
//!
//! - `categories`, `quizzes`, `questions`: one single-item and one collection
//!   endpoint per entity, mounted under `api.base_path`
//! - `health`: liveness, readiness, version and metrics endpoints

pub mod categories;
pub mod health;
pub mod questions;
pub mod quizzes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use serde_json::{Map, Value};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::Record;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::security_headers::security_headers_middleware;
use crate::shape::shape_optional;
use crate::state::AppState;

/// Request bodies are small form posts; anything bigger is rejected with 413.
pub(crate) const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Resource routes, relative to the API base path.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::list_categories).post(categories::create_category))
        .route("/categories/{id}", get(categories::get_category))
        .route("/quizes", get(quizzes::list_quizzes).post(quizzes::create_quiz))
        .route("/quizes/{id}", get(quizzes::get_quiz))
        .route("/questions", get(questions::list_questions).post(questions::create_question))
        .route("/questions/{id}", get(questions::get_question))
}

/// Builds the complete application router from an explicit state.
pub fn router(state: AppState) -> Router {
    let base_path = state.config.api.base_path.clone();
    let cfg_arc = state.config.clone();

    let app = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(health::version))
        .route("/metrics", get(health::metrics))
        .nest(&base_path, api_routes())
        .fallback(fallback)
        .with_state(state);

    with_layers(app, cfg_arc)
}

/// Body limit, request timeout, tracing, security headers and (debug only) CORS.
pub(crate) fn with_layers(app: Router, cfg: Arc<AppConfig>) -> Router {
    let timeout = Duration::from_secs(cfg.server.request_timeout_secs);

    let app = app
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg, security_headers_middleware));

    // CORS: permissive in debug builds for local front-end development
    if cfg!(debug_assertions) {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

async fn fallback() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}

/// Path ids arrive as text. Anything that is not an integer cannot match a row.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Converts a store error and counts it.
pub(crate) fn store_err(state: &AppState) -> impl Fn(sqlx::Error) -> AppError + '_ {
    move |e| state.record_error(e.into())
}

/// Shapes a single-item lookup. Missing rows become `{}` unless the API runs
/// with `strict_not_found`.
pub(crate) fn single_item(
    state: &AppState,
    entity: &str,
    fields: &[&str],
    row: Option<Record>,
) -> AppResult<Map<String, Value>> {
    if state.config.api.strict_not_found {
        let row = row.ok_or_not_found(entity)?;
        return Ok(shape_optional(fields, Some(row.as_slice()), &[]));
    }
    Ok(shape_optional(fields, row.as_deref(), &[]))
}
