//! In-memory reader and writer.

use crate::component::{Component, FrameReader, FrameWriter};
use crate::context::{TransactionContext, TransformContext};
use crate::errors::Result;
use crate::frame::Frame;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Reads frames from a vector, flagging the final one as the last frame.
#[derive(Debug, Default)]
pub struct FrameVecReader {
    frames: VecDeque<Frame>,
}

impl FrameVecReader {
    /// Creates a reader over `frames`.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Returns the number of unread frames.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Component for FrameVecReader {
    fn name(&self) -> &str {
        "FrameVecReader"
    }
}

#[async_trait]
impl FrameReader for FrameVecReader {
    async fn read(
        &mut self,
        _context: &TransformContext,
        transaction: &mut TransactionContext,
    ) -> Result<Option<Frame>> {
        let frame = self.frames.pop_front();
        if frame.is_some() && self.frames.is_empty() {
            transaction.set_last_frame(true);
        }
        Ok(frame)
    }

    fn eof(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Collects written frames in shared memory.
///
/// Clones share the same buffer, so a test can keep one handle while the
/// engine owns the other.
#[derive(Debug, Clone)]
pub struct CollectingWriter {
    name: String,
    frames: Arc<RwLock<Vec<Frame>>>,
}

impl Default for CollectingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::named("CollectingWriter")
    }

    /// Creates an empty writer with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Arc::default(),
        }
    }

    /// Returns a copy of the written frames.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.read().clone()
    }

    /// Returns the number of written frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }
}

impl Component for CollectingWriter {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl FrameWriter for CollectingWriter {
    async fn write(&mut self, _context: &TransformContext, transaction: &TransactionContext) -> Result<()> {
        self.frames.write().push(transaction.output_frame().clone());
        Ok(())
    }
}
