use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::metrics::Metrics;

/// The shared application state.
///
/// Cloned into every handler by axum. Holds no mutable data besides the
/// atomic counters in [`Metrics`]; all entity state lives in the store.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Request counters.
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        Self { db, config: Arc::new(config), metrics: Metrics::new() }
    }

    /// Counts an error against the matching metric before it is returned.
    pub fn record_error(&self, err: AppError) -> AppError {
        match &err {
            AppError::ValidationError { .. } | AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => {
                tracing::debug!(error = %err, "Request rejected");
                self.metrics.inc_validation_failures()
            }
            AppError::Database(_) | AppError::ServiceUnavailable { .. } => self.metrics.inc_storage_errors(),
            _ => {}
        }
        err
    }
}
