//! Job timing tied to a `tracing` span.

use std::time::Instant;
use tracing::{info_span, Span};
use uuid::Uuid;

/// Times one job run and carries the span its record loop runs in.
#[derive(Debug)]
pub struct JobTimer {
    start: Instant,
    span: Span,
}

impl JobTimer {
    /// Starts timing and opens a `job` span tagged with the job name and run id.
    #[must_use]
    pub fn start(job: &str, run_id: Uuid) -> Self {
        Self {
            start: Instant::now(),
            span: info_span!("job", job = %job, run_id = %run_id),
        }
    }

    /// Returns the job span.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Milliseconds since the timer started.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
