//! Sorts the whole stream by one field.

use super::order::SortOrder;
use super::FrameAggregator;
use crate::component::{Component, ConfigSection};
use crate::errors::Result;
use crate::frame::{Frame, Value};
use std::collections::HashMap;
use tracing::debug;

/// Buffers every frame and emits them ordered by `field`.
///
/// Frames sharing a value keep their arrival order.
#[derive(Debug)]
pub struct SortAggregator {
    name: String,
    field: String,
    order: SortOrder,
    frames: Vec<Frame>,
}

impl SortAggregator {
    /// Creates an ascending sort on `field`.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            name: "Sort".to_string(),
            field: field.into(),
            order: SortOrder::Ascend,
            frames: Vec::new(),
        }
    }

    /// Reads `Field` and `Sort` (default `Ascend`).
    pub fn from_config(section: &ConfigSection) -> Result<Self> {
        let mut sort = Self::new(section.require_str("Field")?);
        if let Some(name) = section.get_str("name") {
            sort.name = name;
        }
        if let Some(order) = section.get_str("Sort") {
            sort.order = order.parse()?;
        }
        Ok(sort)
    }

    /// Sets the order.
    #[must_use]
    pub const fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

impl Component for SortAggregator {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameAggregator for SortAggregator {
    fn accumulate(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn compile(&mut self) -> Vec<Frame> {
        let mut values: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<Frame>> = HashMap::new();
        for frame in self.frames.drain(..) {
            let value = frame
                .get_path(&self.field)
                .map(Value::to_text)
                .unwrap_or_default();
            buckets
                .entry(value)
                .or_insert_with_key(|value| {
                    values.push(value.clone());
                    Vec::new()
                })
                .push(frame);
        }

        let order = self.order;
        values.sort_by(|a, b| order.compare(a, b));

        let out: Vec<Frame> = values
            .iter()
            .filter_map(|value| buckets.remove(value))
            .flatten()
            .collect();
        debug!(aggregator = %self.name, frames = out.len(), "Compiled sort");
        out
    }

    fn buffered(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_keep_arrival_order() {
        let mut sort = SortAggregator::new("Price");
        for (seq, price) in [(1, "9"), (2, "10"), (3, "9"), (4, "2.5")] {
            sort.accumulate(Frame::new().with("Price", price).with("Seq", seq));
        }

        let seqs: Vec<_> = sort
            .compile()
            .iter()
            .filter_map(|f| f.get("Seq").and_then(Value::as_f64))
            .collect();
        assert_eq!(seqs, vec![4.0, 1.0, 3.0, 2.0]);
        assert_eq!(sort.buffered(), 0);
    }

    #[test]
    fn test_missing_field_sorts_as_empty() {
        let mut sort = SortAggregator::new("Name");
        sort.accumulate(Frame::new().with("Name", "b"));
        sort.accumulate(Frame::new().with("Other", 1));
        sort.accumulate(Frame::new().with("Name", "a"));

        let names: Vec<String> = sort
            .compile()
            .iter()
            .map(|f| f.get("Name").map(Value::to_text).unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["", "a", "b"]);
    }

    #[test]
    fn test_mixed_values_ignore_arrival_order() {
        for arrivals in [["10", "2", "1a"], ["1a", "2", "10"], ["2", "1a", "10"]] {
            let mut sort = SortAggregator::new("Price").with_order(SortOrder::Descend);
            for price in arrivals {
                sort.accumulate(Frame::new().with("Price", price));
            }
            let prices: Vec<String> = sort
                .compile()
                .iter()
                .filter_map(|f| f.get("Price").map(Value::to_text))
                .collect();
            assert_eq!(prices, vec!["1a", "10", "2"]);
        }
    }
}
