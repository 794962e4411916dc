//! Per-record transaction context.

use super::ContextListener;
use crate::frame::Frame;
use std::fmt;
use std::sync::Arc;

/// One of the three frame views held by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameView {
    /// The frame as read; never mutated.
    Source,
    /// The mutable scratch frame.
    Working,
    /// The frame assembled for the writer.
    Target,
}

impl FrameView {
    /// Matches a path prefix case-insensitively.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        if prefix.eq_ignore_ascii_case("source") {
            Some(Self::Source)
        } else if prefix.eq_ignore_ascii_case("working") {
            Some(Self::Working)
        } else if prefix.eq_ignore_ascii_case("target") {
            Some(Self::Target)
        } else {
            None
        }
    }
}

impl fmt::Display for FrameView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "Source"),
            Self::Working => write!(f, "Working"),
            Self::Target => write!(f, "Target"),
        }
    }
}

/// State of a single record's pass through the pipeline.
///
/// Created by the engine for every record read and dropped once the record
/// completes. The source frame is the audit trail and is never mutated after
/// it is set; stages work on the working frame and the mapping stage builds
/// the target frame.
#[derive(Clone, Default)]
pub struct TransactionContext {
    source: Frame,
    working: Frame,
    target: Option<Frame>,
    row: u64,
    last_frame: bool,
    error: Option<String>,
    listeners: Vec<Arc<dyn ContextListener>>,
}

impl TransactionContext {
    /// Creates an empty transaction for the given row.
    #[must_use]
    pub fn new(row: u64) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    /// Creates a transaction whose source and working frames hold `frame`.
    #[must_use]
    pub fn with_source(row: u64, frame: Frame) -> Self {
        let mut txn = Self::new(row);
        txn.set_source_frame(frame);
        txn
    }

    /// Sets the source frame and seeds the working frame with a copy.
    pub(crate) fn set_source_frame(&mut self, frame: Frame) {
        self.working = frame.clone();
        self.source = frame;
    }

    /// Derives the transaction a writer sees for one aggregated frame.
    ///
    /// The frame becomes the target; row, source and end-of-stream flag are
    /// kept. Listeners are not carried over, and neither is the record
    /// error: flushed frames come from earlier records that passed, so a
    /// `transactionError` condition is false for them even when the record
    /// that triggered the flush failed.
    pub(crate) fn for_output(&self, frame: Frame) -> Self {
        Self {
            source: self.source.clone(),
            working: Frame::new(),
            target: Some(frame),
            row: self.row,
            last_frame: self.last_frame,
            error: None,
            listeners: Vec::new(),
        }
    }

    /// Returns the source frame.
    #[must_use]
    pub const fn source(&self) -> &Frame {
        &self.source
    }

    /// Returns the working frame.
    #[must_use]
    pub const fn working(&self) -> &Frame {
        &self.working
    }

    /// Returns the working frame mutably.
    pub fn working_mut(&mut self) -> &mut Frame {
        &mut self.working
    }

    /// Returns the target frame, if a mapping stage built one.
    #[must_use]
    pub const fn target(&self) -> Option<&Frame> {
        self.target.as_ref()
    }

    /// Replaces the target frame.
    pub fn set_target(&mut self, frame: Frame) {
        self.target = Some(frame);
    }

    /// Returns the target frame mutably, creating an empty one if needed.
    pub fn target_mut(&mut self) -> &mut Frame {
        self.target.get_or_insert_with(Frame::new)
    }

    /// Returns the frame a writer consumes: the target if one was built,
    /// otherwise the working frame.
    #[must_use]
    pub fn output_frame(&self) -> &Frame {
        self.target.as_ref().unwrap_or(&self.working)
    }

    /// Returns the requested view. The target view is `None` until mapped.
    #[must_use]
    pub fn view(&self, view: FrameView) -> Option<&Frame> {
        match view {
            FrameView::Source => Some(&self.source),
            FrameView::Working => Some(&self.working),
            FrameView::Target => self.target.as_ref(),
        }
    }

    /// Returns the 0-based ordinal of this record within the job.
    #[must_use]
    pub const fn row(&self) -> u64 {
        self.row
    }

    /// Returns true if this is the final record of the stream.
    #[must_use]
    pub const fn is_last_frame(&self) -> bool {
        self.last_frame
    }

    /// Flags this record as the last of the stream. Only readers call this.
    pub fn set_last_frame(&mut self, last: bool) {
        self.last_frame = last;
    }

    /// Records an error on this record.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Clears the record error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Returns true if an error was recorded.
    #[must_use]
    pub const fn is_in_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Registers a listener for this record only.
    pub fn add_listener(&mut self, listener: Arc<dyn ContextListener>) {
        self.listeners.push(listener);
    }

    /// Returns the record-scoped listeners.
    #[must_use]
    pub fn listeners(&self) -> &[Arc<dyn ContextListener>] {
        &self.listeners
    }
}

impl fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("row", &self.row)
            .field("last_frame", &self.last_frame)
            .field("error", &self.error)
            .field("source", &self.source)
            .field("working", &self.working)
            .field("target", &self.target)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;

    #[test]
    fn test_source_seeds_working() {
        let mut txn = TransactionContext::with_source(0, Frame::new().with("a", 1));
        txn.working_mut().put("a", 2);

        assert_eq!(txn.source().get("a"), Some(&Value::Integer(1)));
        assert_eq!(txn.working().get("a"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_output_frame_prefers_target() {
        let mut txn = TransactionContext::with_source(0, Frame::new().with("a", 1));
        assert_eq!(txn.output_frame(), txn.working());

        txn.target_mut().put("b", 2);
        assert_eq!(txn.output_frame().get("b"), Some(&Value::Integer(2)));
        assert!(txn.view(FrameView::Target).is_some());
    }

    #[test]
    fn test_prefix_matching_is_case_insensitive() {
        assert_eq!(FrameView::from_prefix("WORKING"), Some(FrameView::Working));
        assert_eq!(FrameView::from_prefix("source"), Some(FrameView::Source));
        assert_eq!(FrameView::from_prefix("Target"), Some(FrameView::Target));
        assert_eq!(FrameView::from_prefix("Context"), None);
    }

    #[test]
    fn test_error_flag() {
        let mut txn = TransactionContext::new(3);
        assert!(!txn.is_in_error());
        txn.set_error("bad record");
        assert_eq!(txn.error_message(), Some("bad record"));
        txn.clear_error();
        assert!(!txn.is_in_error());
    }
}
