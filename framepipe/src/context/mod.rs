//! Context management for pipeline execution.
//!
//! This module provides:
//! - The job-scoped `TransformContext` (symbols, error flag, disposition)
//! - The per-record `TransactionContext` (source/working/target frames)
//! - Lifecycle listeners notified by the engine

mod disposition;
mod listener;
mod symbols;
mod transaction;
mod transform;

pub use disposition::Disposition;
pub use listener::{CollectingListener, ContextListener, ContextScope, ListenerEvent, LoggingListener};
pub use symbols::SymbolTable;
pub use transaction::{FrameView, TransactionContext};
pub use transform::TransformContext;

/// Field names of an exported disposition frame.
pub mod disposition_fields {
    pub use super::disposition::{
        END_TIME, ERROR_MESSAGE, ERROR_STATE, FRAME_COUNT, RUN_COUNT, START_TIME,
    };
}
