//! Context lifecycle listeners.

use super::{TransactionContext, TransformContext};
use crate::frame::Frame;
use parking_lot::RwLock;
use tracing::{debug, info, warn, Level};

/// The context a start/end/error notification refers to.
#[derive(Debug, Clone, Copy)]
pub enum ContextScope<'a> {
    /// The job-scoped transform context.
    Job(&'a TransformContext),
    /// A single record's transaction context.
    Transaction(&'a TransactionContext),
}

impl ContextScope<'_> {
    /// Returns the record row for transaction scopes.
    #[must_use]
    pub fn row(&self) -> Option<u64> {
        match self {
            Self::Job(_) => None,
            Self::Transaction(txn) => Some(txn.row()),
        }
    }
}

/// Receives lifecycle notifications from the engine.
///
/// Listeners registered on the transform context see every event of the
/// job; listeners registered on a transaction context see only the events
/// of that record. All methods default to no-ops.
pub trait ContextListener: Send + Sync {
    /// A job or record started.
    fn on_start(&self, _scope: ContextScope<'_>) {}

    /// A job or record finished its pass through the pipeline.
    fn on_end(&self, _scope: ContextScope<'_>) {}

    /// A frame was read into the transaction.
    fn on_read(&self, _txn: &TransactionContext) {}

    /// A frame was handed to a writer.
    fn on_write(&self, _txn: &TransactionContext, _frame: &Frame) {}

    /// An error was recorded on the job or a record.
    fn on_error(&self, _scope: ContextScope<'_>, _message: &str) {}

    /// A validator rejected the record.
    fn on_validation_failed(&self, _txn: &TransactionContext, _validator: &str, _message: &str) {}

    /// The mapping stage assembled the target frame.
    fn on_map(&self, _txn: &TransactionContext) {}
}

/// A listener that logs lifecycle events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingListener {
    level: Level,
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggingListener {
    /// Creates a logging listener with the specified level.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates an info-level logging listener.
    #[must_use]
    pub const fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log(&self, event: &str, row: Option<u64>, detail: &str) {
        if self.level == Level::INFO {
            info!(event = %event, row = ?row, detail = %detail, "Context event: {}", event);
        } else {
            debug!(event = %event, row = ?row, detail = %detail, "Context event: {}", event);
        }
    }
}

impl ContextListener for LoggingListener {
    fn on_start(&self, scope: ContextScope<'_>) {
        if let ContextScope::Job(ctx) = scope {
            self.log("job.start", None, ctx.job_name());
        }
    }

    fn on_end(&self, scope: ContextScope<'_>) {
        match scope {
            ContextScope::Job(ctx) => {
                let detail = format!("{} rows processed", ctx.rows_processed());
                self.log("job.end", None, &detail);
            }
            ContextScope::Transaction(txn) => self.log("record.end", Some(txn.row()), ""),
        }
    }

    fn on_read(&self, txn: &TransactionContext) {
        self.log("record.read", Some(txn.row()), &txn.source().to_string());
    }

    fn on_write(&self, txn: &TransactionContext, frame: &Frame) {
        self.log("record.write", Some(txn.row()), &frame.to_string());
    }

    fn on_error(&self, scope: ContextScope<'_>, message: &str) {
        warn!(row = ?scope.row(), error = %message, "Context error");
    }

    fn on_validation_failed(&self, txn: &TransactionContext, validator: &str, message: &str) {
        let detail = format!("{validator}: {message}");
        self.log("record.invalid", Some(txn.row()), &detail);
    }

    fn on_map(&self, txn: &TransactionContext) {
        self.log("record.map", Some(txn.row()), "");
    }
}

/// A recorded lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerEvent {
    /// Event name, e.g. `record.read`.
    pub event: String,
    /// Record row, absent for job events.
    pub row: Option<u64>,
    /// Event-specific detail.
    pub detail: String,
}

/// A listener that records every event, for testing.
#[derive(Debug, Default)]
pub struct CollectingListener {
    events: RwLock<Vec<ListenerEvent>>,
}

impl CollectingListener {
    /// Creates a new collecting listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns events with the given name.
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<ListenerEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event == event)
            .cloned()
            .collect()
    }

    fn record(&self, event: &str, row: Option<u64>, detail: impl Into<String>) {
        self.events.write().push(ListenerEvent {
            event: event.to_string(),
            row,
            detail: detail.into(),
        });
    }
}

impl ContextListener for CollectingListener {
    fn on_start(&self, scope: ContextScope<'_>) {
        match scope {
            ContextScope::Job(ctx) => self.record("job.start", None, ctx.job_name()),
            ContextScope::Transaction(txn) => self.record("record.start", Some(txn.row()), ""),
        }
    }

    fn on_end(&self, scope: ContextScope<'_>) {
        match scope {
            ContextScope::Job(ctx) => self.record("job.end", None, ctx.job_name()),
            ContextScope::Transaction(txn) => self.record("record.end", Some(txn.row()), ""),
        }
    }

    fn on_read(&self, txn: &TransactionContext) {
        self.record("record.read", Some(txn.row()), txn.source().to_string());
    }

    fn on_write(&self, txn: &TransactionContext, frame: &Frame) {
        self.record("record.write", Some(txn.row()), frame.to_string());
    }

    fn on_error(&self, scope: ContextScope<'_>, message: &str) {
        self.record("error", scope.row(), message);
    }

    fn on_validation_failed(&self, txn: &TransactionContext, validator: &str, _message: &str) {
        self.record("record.invalid", Some(txn.row()), validator);
    }

    fn on_map(&self, txn: &TransactionContext) {
        self.record("record.map", Some(txn.row()), "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_listener_records_scopes() {
        let listener = CollectingListener::new();
        let ctx = TransformContext::new("job");
        let txn = TransactionContext::new(4);

        listener.on_start(ContextScope::Job(&ctx));
        listener.on_read(&txn);
        listener.on_error(ContextScope::Transaction(&txn), "bad");
        listener.on_end(ContextScope::Job(&ctx));

        assert_eq!(listener.len(), 4);
        let errors = listener.events_named("error");
        assert_eq!(errors[0].row, Some(4));
        assert_eq!(errors[0].detail, "bad");
        assert_eq!(listener.events()[0].detail, "job");
    }

    #[test]
    fn test_logging_listener_does_not_panic() {
        let listener = LoggingListener::info();
        let ctx = TransformContext::new("job");
        let txn = TransactionContext::new(0);

        listener.on_start(ContextScope::Job(&ctx));
        listener.on_write(&txn, &Frame::new().with("a", 1));
        listener.on_validation_failed(&txn, "NotEmpty", "empty");
        listener.on_end(ContextScope::Transaction(&txn));
    }
}
