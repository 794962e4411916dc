//! Groups frames by a key field with a per-key sliding window.

use super::order::SortOrder;
use super::{read_limit, FrameAggregator};
use crate::component::{Component, ConfigSection};
use crate::errors::Result;
use crate::frame::{Frame, Value};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Buffers frames per distinct key value.
///
/// Each key keeps at most `limit` frames, dropping its oldest on overflow.
/// On compile, keys are visited in the configured order (first-seen by
/// default) and each key's frames are emitted in arrival order. Frames
/// without the key field group under the empty string.
#[derive(Debug)]
pub struct GroupingAggregator {
    name: String,
    key: String,
    limit: Option<usize>,
    order: SortOrder,
    groups: HashMap<String, VecDeque<Frame>>,
    keys: Vec<String>,
}

impl GroupingAggregator {
    /// Creates an unbounded grouping on `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            name: "Grouping".to_string(),
            key: key.into(),
            limit: None,
            order: SortOrder::None,
            groups: HashMap::new(),
            keys: Vec::new(),
        }
    }

    /// Reads `Key`, `Limit` and `Sort`.
    pub fn from_config(section: &ConfigSection) -> Result<Self> {
        let mut grouping = Self::new(section.require_str("Key")?);
        if let Some(name) = section.get_str("name") {
            grouping.name = name;
        }
        grouping.limit = read_limit(section, false);
        if let Some(order) = section.get_str("Sort") {
            grouping.order = order.parse()?;
        }
        Ok(grouping)
    }

    /// Caps each key's window.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    /// Sets the key emission order.
    #[must_use]
    pub const fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns the number of distinct keys seen.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl Component for GroupingAggregator {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameAggregator for GroupingAggregator {
    fn accumulate(&mut self, frame: Frame) {
        let key = frame
            .get_path(&self.key)
            .map(Value::to_text)
            .unwrap_or_default();
        if !self.groups.contains_key(&key) {
            self.keys.push(key.clone());
        }
        let group = self.groups.entry(key).or_default();
        group.push_back(frame);
        if let Some(limit) = self.limit {
            while group.len() > limit {
                group.pop_front();
            }
        }
    }

    fn compile(&mut self) -> Vec<Frame> {
        let mut keys = std::mem::take(&mut self.keys);
        let order = self.order;
        keys.sort_by(|a, b| order.compare(a, b));

        let mut out = Vec::with_capacity(self.buffered());
        for key in keys {
            if let Some(group) = self.groups.remove(&key) {
                out.extend(group);
            }
        }
        self.groups.clear();
        debug!(aggregator = %self.name, frames = out.len(), "Compiled groups");
        out
    }

    fn buffered(&self) -> usize {
        self.groups.values().map(VecDeque::len).sum()
    }
}
