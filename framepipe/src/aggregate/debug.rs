//! Pass-through strategy that logs what it buffers.

use super::FrameAggregator;
use crate::component::{Component, ConfigSection};
use crate::frame::Frame;
use tracing::debug;

/// Buffers every frame, logging it, and emits them in arrival order.
#[derive(Debug)]
pub struct DebugAggregator {
    name: String,
    frames: Vec<Frame>,
}

impl Default for DebugAggregator {
    fn default() -> Self {
        Self {
            name: "Debug".to_string(),
            frames: Vec::new(),
        }
    }
}

impl DebugAggregator {
    /// Creates the aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the optional `name`.
    #[must_use]
    pub fn from_config(section: &ConfigSection) -> Self {
        let mut aggregator = Self::new();
        if let Some(name) = section.get_str("name") {
            aggregator.name = name;
        }
        aggregator
    }
}

impl Component for DebugAggregator {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameAggregator for DebugAggregator {
    fn accumulate(&mut self, frame: Frame) {
        debug!(aggregator = %self.name, position = self.frames.len(), frame = %frame, "Buffered frame");
        self.frames.push(frame);
    }

    fn compile(&mut self) -> Vec<Frame> {
        debug!(aggregator = %self.name, frames = self.frames.len(), "Releasing buffered frames");
        std::mem::take(&mut self.frames)
    }

    fn buffered(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TransactionContext;

    #[test]
    fn test_emits_arrival_order_on_last_frame() {
        let mut aggregator = DebugAggregator::new();
        let first = TransactionContext::new(0);
        let mut last = TransactionContext::new(1);
        last.set_last_frame(true);

        assert!(aggregator
            .process(vec![Frame::new().with("n", 1)], &first)
            .is_empty());
        let out = aggregator.process(vec![Frame::new().with("n", 2)], &last);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("n").and_then(|v| v.as_f64()), Some(1.0));
        assert_eq!(aggregator.buffered(), 0);
    }
}
