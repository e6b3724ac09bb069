use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub categories_created: Arc<AtomicU64>,
    pub quizzes_created: Arc<AtomicU64>,
    pub questions_created: Arc<AtomicU64>,
    pub options_created: Arc<AtomicU64>,
    pub validation_failures: Arc<AtomicU64>,
    pub storage_errors: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            categories_created: Arc::new(AtomicU64::new(0)),
            quizzes_created: Arc::new(AtomicU64::new(0)),
            questions_created: Arc::new(AtomicU64::new(0)),
            options_created: Arc::new(AtomicU64::new(0)),
            validation_failures: Arc::new(AtomicU64::new(0)),
            storage_errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_categories(&self) {
        self.categories_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_quizzes(&self) {
        self.quizzes_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_questions(&self) {
        self.questions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_options(&self, count: u64) {
        self.options_created.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_storage_errors(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            categories_created: self.categories_created.load(Ordering::Relaxed),
            quizzes_created: self.quizzes_created.load(Ordering::Relaxed),
            questions_created: self.questions_created.load(Ordering::Relaxed),
            options_created: self.options_created.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub categories_created: u64,
    pub quizzes_created: u64,
    pub questions_created: u64,
    pub options_created: u64,
    pub validation_failures: u64,
    pub storage_errors: u64,
    pub uptime_seconds: u64,
}
