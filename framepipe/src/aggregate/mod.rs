//! Aggregation stages that buffer frames until the end of the stream.
//!
//! Every aggregator returns nothing until the record flagged as the last
//! frame arrives, then emits its compiled batch once and forgets it.

mod debug;
mod grouping;
mod order;
mod size;
mod sort;

pub use debug::DebugAggregator;
pub use grouping::GroupingAggregator;
pub use order::SortOrder;
pub use size::SizeAggregator;
pub use sort::SortAggregator;

use crate::component::{Component, ConfigSection, Gated};
use crate::context::{TransactionContext, TransformContext};
use crate::errors::{ConfigError, Result};
use crate::frame::Frame;
use tracing::warn;

/// A buffering strategy.
pub trait FrameAggregator: Component {
    /// Adds a frame to the buffer.
    fn accumulate(&mut self, frame: Frame);

    /// Drains the buffer into the emitted batch.
    fn compile(&mut self) -> Vec<Frame>;

    /// Returns the number of frames currently buffered.
    fn buffered(&self) -> usize;

    /// Buffers `frames` and returns the compiled batch on the last frame.
    fn process(&mut self, frames: Vec<Frame>, transaction: &TransactionContext) -> Vec<Frame> {
        for frame in frames {
            self.accumulate(frame);
        }
        if transaction.is_last_frame() {
            self.compile()
        } else {
            Vec::new()
        }
    }
}

impl<T: FrameAggregator + ?Sized> FrameAggregator for Box<T> {
    fn accumulate(&mut self, frame: Frame) {
        (**self).accumulate(frame);
    }

    fn compile(&mut self) -> Vec<Frame> {
        (**self).compile()
    }

    fn buffered(&self) -> usize {
        (**self).buffered()
    }

    fn process(&mut self, frames: Vec<Frame>, transaction: &TransactionContext) -> Vec<Frame> {
        (**self).process(frames, transaction)
    }
}

impl<T: FrameAggregator> Gated<T> {
    /// Runs the aggregator for one record.
    ///
    /// When the gate is closed the frames are dropped, but the last frame
    /// still compiles whatever was buffered earlier.
    pub fn aggregate(
        &mut self,
        context: &TransformContext,
        transaction: &TransactionContext,
        frames: Vec<Frame>,
    ) -> Vec<Frame> {
        if self.permits(context, transaction) {
            self.inner_mut().process(frames, transaction)
        } else if transaction.is_last_frame() {
            self.inner_mut().compile()
        } else {
            Vec::new()
        }
    }
}

/// Builds an aggregator from its `class` attribute.
pub fn from_config(section: &ConfigSection) -> Result<Box<dyn FrameAggregator>> {
    let class = section.class().unwrap_or_default();
    let aggregator: Box<dyn FrameAggregator> = match class.to_ascii_lowercase().as_str() {
        "grouping" | "groupingaggregator" => Box::new(GroupingAggregator::from_config(section)?),
        "sort" | "sortaggregator" => Box::new(SortAggregator::from_config(section)?),
        "size" | "sizeaggregator" => Box::new(SizeAggregator::from_config(section)),
        "debug" | "debugaggregator" => Box::new(DebugAggregator::from_config(section)),
        _ => return Err(ConfigError::UnknownClass(class).into()),
    };
    Ok(aggregator)
}

/// Reads a positive `Limit`; anything else means unbounded.
fn read_limit(section: &ConfigSection, warn_if_missing: bool) -> Option<usize> {
    match section.get_i64("Limit") {
        Ok(Some(limit)) if limit > 0 => usize::try_from(limit).ok(),
        Ok(Some(_)) => None,
        Ok(None) => {
            if warn_if_missing {
                warn!(component = %section.label(), "No Limit configured; buffering without bound");
            }
            None
        }
        Err(e) => {
            warn!(component = %section.label(), error = %e, "Ignoring Limit; buffering without bound");
            None
        }
    }
}
