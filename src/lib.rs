//! # QuizApp Backend Library
//!
//! A small JSON API over four related records: categories, quizzes, questions
//! and the answer options of each question, persisted in SQLite.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: asynchronous SQLite access through a connection pool
//! - **Tokio**: async runtime
//! - **Serde**: JSON (de)serialization
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (defaults, file, environment)
//! - [`db`]: storage gateway, schema and row-level queries
//! - [`shape`]: turns rows into JSON objects
//! - [`params`]: create-request parameter extraction and coercion
//! - [`routes`]: resource handlers and the router
//! - [`error`]: error type and JSON error responses
//! - [`middleware`]: response security headers
//! - [`metrics`]: in-process counters
//! - [`state`]: shared application state
//! - [`types`]: field lists and request/response types

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod params;
pub mod routes;
pub mod shape;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
