//! Outcome of a job run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counters and outcome of one [`TransformEngine::run`](super::TransformEngine::run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    /// The job name.
    pub job_name: String,
    /// The run ID.
    pub run_id: Uuid,
    /// Records read from the reader.
    pub rows_read: u64,
    /// Frames handed to the writers.
    pub frames_written: u64,
    /// Records that finished in error.
    pub record_errors: u64,
    /// Validator rejections.
    pub validation_failures: u64,
    /// Wall time in milliseconds.
    pub elapsed_ms: f64,
    /// Job-level error, if any.
    pub error: Option<String>,
}

impl JobSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new(job_name: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            job_name: job_name.into(),
            run_id,
            rows_read: 0,
            frames_written: 0,
            record_errors: 0,
            validation_failures: 0,
            elapsed_ms: 0.0,
            error: None,
        }
    }

    /// Returns true if the job finished without a job-level error.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
