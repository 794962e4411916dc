//! Keeps the most recent frames.

use super::{read_limit, FrameAggregator};
use crate::component::{Component, ConfigSection};
use crate::frame::Frame;
use std::collections::VecDeque;

/// FIFO window of at most `limit` frames.
#[derive(Debug)]
pub struct SizeAggregator {
    name: String,
    limit: Option<usize>,
    window: VecDeque<Frame>,
}

impl SizeAggregator {
    /// Creates a window; `None` or zero keeps everything.
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            name: "Size".to_string(),
            limit: limit.filter(|l| *l > 0),
            window: VecDeque::new(),
        }
    }

    /// Reads `Limit`. A missing or non-numeric limit keeps everything.
    #[must_use]
    pub fn from_config(section: &ConfigSection) -> Self {
        let mut size = Self::new(read_limit(section, true));
        if let Some(name) = section.get_str("name") {
            size.name = name;
        }
        size
    }

    /// Returns the configured limit.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl Component for SizeAggregator {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameAggregator for SizeAggregator {
    fn accumulate(&mut self, frame: Frame) {
        self.window.push_back(frame);
        if let Some(limit) = self.limit {
            while self.window.len() > limit {
                self.window.pop_front();
            }
        }
    }

    fn compile(&mut self) -> Vec<Frame> {
        self.window.drain(..).collect()
    }

    fn buffered(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_is_unbounded() {
        let mut size = SizeAggregator::new(Some(0));
        for i in 0..5 {
            size.accumulate(Frame::new().with("i", i));
        }
        assert_eq!(size.limit(), None);
        assert_eq!(size.compile().len(), 5);
    }
}
