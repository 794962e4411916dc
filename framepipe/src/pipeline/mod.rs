//! Job configuration and execution.
//!
//! This module provides:
//! - `JobConfig`, the serde job definition
//! - `JobBuilder`, which instantiates configured stages by class name
//! - `TransformEngine`, the record loop
//! - `JobSummary`, the outcome of a run

mod builder;
mod config;
mod engine;
#[cfg(test)]
mod integration_tests;
mod summary;

pub use builder::{
    AggregatorFactory, Factory, JobBuilder, MapperFactory, TransformFactory, ValidatorFactory,
};
pub use config::JobConfig;
pub use engine::TransformEngine;
pub use summary::JobSummary;
