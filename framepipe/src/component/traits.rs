//! Lifecycle and stage contracts.

use crate::context::{TransactionContext, TransformContext};
use crate::errors::Result;
use crate::frame::Frame;
use async_trait::async_trait;

/// Lifecycle shared by every pipeline stage.
///
/// `open` runs once before the first record and may fail the job. `close`
/// runs once after the last record, even when `open` failed part way
/// through the stage list, so it must tolerate an unopened stage.
pub trait Component: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Prepares the stage.
    fn open(&mut self, _context: &mut TransformContext) -> Result<()> {
        Ok(())
    }

    /// Releases the stage's resources.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Produces the job's input frames.
#[async_trait]
pub trait FrameReader: Component {
    /// Reads the next frame, or `None` when exhausted.
    ///
    /// Implementations must call `set_last_frame(true)` on the transaction
    /// that carries the final frame.
    async fn read(
        &mut self,
        context: &TransformContext,
        transaction: &mut TransactionContext,
    ) -> Result<Option<Frame>>;

    /// Returns true once no more frames will be produced.
    fn eof(&self) -> bool;
}

/// Consumes the job's output frames.
#[async_trait]
pub trait FrameWriter: Component {
    /// Writes the transaction's output frame (target, else working).
    async fn write(&mut self, context: &TransformContext, transaction: &TransactionContext)
        -> Result<()>;
}

/// Accepts or rejects a record.
pub trait FrameValidator: Component {
    /// Returns false when the record is invalid.
    fn validate(&mut self, context: &TransformContext, transaction: &TransactionContext)
        -> Result<bool>;

    /// Describes the rule for validation failure messages.
    fn description(&self) -> String {
        format!("{} validation", self.name())
    }
}

/// Mutates the working frame.
pub trait FrameTransform: Component {
    /// Processes one record.
    fn process(&mut self, context: &TransformContext, transaction: &mut TransactionContext)
        -> Result<()>;
}

/// Builds the target frame.
pub trait FrameMapper: Component {
    /// Maps one record.
    fn map(&mut self, context: &TransformContext, transaction: &mut TransactionContext)
        -> Result<()>;
}

impl<T: Component + ?Sized> Component for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self, context: &mut TransformContext) -> Result<()> {
        (**self).open(context)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

#[async_trait]
impl<T: FrameReader + ?Sized> FrameReader for Box<T> {
    async fn read(
        &mut self,
        context: &TransformContext,
        transaction: &mut TransactionContext,
    ) -> Result<Option<Frame>> {
        (**self).read(context, transaction).await
    }

    fn eof(&self) -> bool {
        (**self).eof()
    }
}

#[async_trait]
impl<T: FrameWriter + ?Sized> FrameWriter for Box<T> {
    async fn write(&mut self, context: &TransformContext, transaction: &TransactionContext)
        -> Result<()> {
        (**self).write(context, transaction).await
    }
}

impl<T: FrameValidator + ?Sized> FrameValidator for Box<T> {
    fn validate(&mut self, context: &TransformContext, transaction: &TransactionContext)
        -> Result<bool> {
        (**self).validate(context, transaction)
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

impl<T: FrameTransform + ?Sized> FrameTransform for Box<T> {
    fn process(&mut self, context: &TransformContext, transaction: &mut TransactionContext)
        -> Result<()> {
        (**self).process(context, transaction)
    }
}

impl<T: FrameMapper + ?Sized> FrameMapper for Box<T> {
    fn map(&mut self, context: &TransformContext, transaction: &mut TransactionContext)
        -> Result<()> {
        (**self).map(context, transaction)
    }
}
