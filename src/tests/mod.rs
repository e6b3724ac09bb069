//! Integration and unit tests for the QuizApp backend.
//!
//! ## Test Modules
//!
//! - **api_tests**: end-to-end requests against the full router
//! - **health_api_tests**: liveness, readiness, version and metrics endpoints
//! - **db_tests**: schema creation and the row-level query helpers
//! - **shape_tests**: row to JSON shaping
//! - **params_tests**: request parameter extraction and coercion
//! - **error_tests**: error mapping and JSON error responses
//! - **config_tests**: configuration loading and validation
//!
//! Shared fixtures live in this module: every test app gets its own SQLite
//! file inside a temporary directory.

pub mod api_tests;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt; // for .collect()
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::state::AppState;

pub const BASE: &str = "/quizapp/api/1.0";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = format!("sqlite://{}", dir.path().join("quizapp.db").display());
    cfg.database.max_connections = 2;
    cfg
}

pub async fn setup_with(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut cfg = test_config(&dir);
    configure(&mut cfg);

    let pool = crate::db::connect(&cfg.database).await.unwrap();
    crate::db::init_db(&pool).await.unwrap();

    let state = AppState::new(pool, cfg);
    let app = crate::routes::router(state.clone());
    TestApp { app, state, _dir: dir }
}

pub async fn setup_test_app() -> TestApp {
    setup_with(|_| {}).await
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn call(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_bytes(res: Response) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Sends `req` and decodes the JSON body (`Null` for an empty body).
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = call(app, req).await;
    let status = res.status();
    let bytes = body_bytes(res).await;
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&bytes).unwrap())
}
