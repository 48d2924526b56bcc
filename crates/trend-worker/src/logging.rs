//! Structured run logging utilities.
//!
//! Every pipeline run gets a [`RunLogger`] carrying a fresh run id and the
//! category, so all log lines of one poster can be correlated.

use tracing::{info, warn, Span};
use trend_models::Category;
use uuid::Uuid;

/// Logger for one `generate_poster` run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    category: Category,
}

impl RunLogger {
    pub fn new(category: Category) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            category,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            category = %self.category,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            category = %self.category,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            category = %self.category,
            "Run warning: {}", message
        );
    }

    /// Exhaustion is an expected outcome for the scheduler, so it is a warning.
    pub fn log_exhausted(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            category = %self.category,
            "Run exhausted: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            category = %self.category,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "poster_run",
            run_id = %self.run_id,
            category = %self.category
        )
    }
}
