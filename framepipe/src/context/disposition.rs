//! Job disposition: the outcome record of a job run.

use crate::frame::{Frame, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Field name holding the job start time.
pub const START_TIME: &str = "StartTime";
/// Field name holding the job end time.
pub const END_TIME: &str = "EndTime";
/// Field name holding the number of times the job has run.
pub const RUN_COUNT: &str = "RunCount";
/// Field name holding the number of frames processed.
pub const FRAME_COUNT: &str = "FrameCount";
/// Field name holding the boolean error state.
pub const ERROR_STATE: &str = "ErrorState";
/// Field name holding the error message, if any.
pub const ERROR_MESSAGE: &str = "ErrorMessage";

/// Outcome of a job run, written at job start and end.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Disposition {
    /// When the most recent run started.
    pub start_time: Option<DateTime<Utc>>,
    /// When the most recent run ended.
    pub end_time: Option<DateTime<Utc>>,
    /// How many times the job has been started.
    pub run_count: u64,
    /// Frames processed by the most recent run.
    pub frame_count: u64,
    /// Error message of the most recent run, if it failed.
    pub error: Option<String>,
}

impl Disposition {
    /// Records a run start.
    pub fn record_start(&mut self) {
        self.start_time = Some(Utc::now());
        self.end_time = None;
        self.run_count += 1;
        self.frame_count = 0;
        self.error = None;
    }

    /// Records a run end.
    pub fn record_end(&mut self, frame_count: u64, error: Option<String>) {
        self.end_time = Some(Utc::now());
        self.frame_count = frame_count;
        self.error = error;
    }

    /// Returns true if the most recent run ended with an error.
    #[must_use]
    pub fn is_in_error(&self) -> bool {
        self.error.is_some()
    }

    /// Exports the disposition as a frame so it can be registered as a
    /// symbol in another job's context.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        Frame::new()
            .with(START_TIME, self.start_time)
            .with(END_TIME, self.end_time)
            .with(RUN_COUNT, self.run_count)
            .with(FRAME_COUNT, self.frame_count)
            .with(ERROR_STATE, self.is_in_error())
            .with(ERROR_MESSAGE, self.error.clone())
    }

    /// Reads the error state from an exported disposition frame.
    ///
    /// Returns `None` when the frame does not look like a disposition.
    #[must_use]
    pub fn error_state_of(frame: &Frame) -> Option<bool> {
        frame.get(ERROR_STATE).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_end() {
        let mut disposition = Disposition::default();
        disposition.record_start();
        disposition.record_end(12, None);

        assert_eq!(disposition.run_count, 1);
        assert_eq!(disposition.frame_count, 12);
        assert!(disposition.start_time.is_some());
        assert!(disposition.end_time.is_some());
        assert!(!disposition.is_in_error());
    }

    #[test]
    fn test_restart_clears_error() {
        let mut disposition = Disposition::default();
        disposition.record_start();
        disposition.record_end(0, Some("boom".to_string()));
        assert!(disposition.is_in_error());

        disposition.record_start();
        assert!(!disposition.is_in_error());
        assert_eq!(disposition.run_count, 2);
    }

    #[test]
    fn test_frame_export() {
        let mut disposition = Disposition::default();
        disposition.record_start();
        disposition.record_end(3, Some("bad".to_string()));

        let frame = disposition.to_frame();
        assert_eq!(frame.get(FRAME_COUNT), Some(&Value::Integer(3)));
        assert_eq!(Disposition::error_state_of(&frame), Some(true));
        assert_eq!(frame.get(ERROR_MESSAGE), Some(&Value::from("bad")));
        assert_eq!(Disposition::error_state_of(&Frame::new()), None);
    }
}
