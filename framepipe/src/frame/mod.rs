//! Frames: the records moved through a pipeline.
//!
//! This module provides:
//! - The `Frame` record type with ordered, uniquely named fields
//! - The `Value` type carried by each field

mod record;
mod value;

pub use record::{Field, Frame};
pub use value::{date_from_millis, Value};
