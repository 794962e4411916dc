//! # Framepipe
//!
//! A configurable record-transformation pipeline.
//!
//! A job reads records as [`Frame`](frame::Frame)s and passes each one,
//! end to end, through validators, transforms, an optional mapping stage,
//! aggregators and writers. Every stage can be disabled or gated by a
//! boolean condition evaluated against the job and record contexts:
//!
//! - **Contexts**: a job-scoped `TransformContext` (symbols, error state,
//!   disposition) and a per-record `TransactionContext` (source, working
//!   and target frames)
//! - **Conditions**: a small expression language (`islast`,
//!   `checkField(...)`, arithmetic, comparisons) compiled once at open
//! - **Aggregation**: grouping, sorting and windowing strategies that emit
//!   on the last frame
//! - **Bridge**: request/response access to a running engine
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use framepipe::prelude::*;
//!
//! let config = JobConfig::from_file("job.json")?;
//! let writer = CollectingWriter::new();
//! let mut engine = JobBuilder::new(config)
//!     .with_writer(writer.clone())
//!     .build(FrameVecReader::new(frames))?;
//!
//! let summary = engine.run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod aggregate;
pub mod bridge;
pub mod component;
pub mod context;
pub mod errors;
pub mod eval;
pub mod frame;
pub mod observability;
pub mod pipeline;
pub mod stages;

pub use errors::{BridgeError, ConfigError, FramepipeError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::aggregate::{
        DebugAggregator, FrameAggregator, GroupingAggregator, SizeAggregator, SortAggregator,
        SortOrder,
    };
    pub use crate::bridge::{BridgeConfig, BridgeResponse, RequestBridge, RequestReader, ShutdownHandle};
    pub use crate::component::{
        Component, ConfigSection, FrameMapper, FrameReader, FrameTransform, FrameValidator,
        FrameWriter, Gate, Gated,
    };
    pub use crate::context::{
        ContextListener, ContextScope, LoggingListener, SymbolTable, TransactionContext,
        TransformContext,
    };
    pub use crate::errors::{BridgeError, ConfigError, FramepipeError, Result};
    pub use crate::eval::{Condition, Evaluator, Expression};
    pub use crate::frame::{Frame, Value};
    pub use crate::observability::{init_logging, LoggingConfig};
    pub use crate::pipeline::{JobBuilder, JobConfig, JobSummary, TransformEngine};
    pub use crate::stages::{CollectingWriter, FieldMapper, FrameVecReader, NotEmptyValidator, SetTransform};
}
