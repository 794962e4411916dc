//! Stage contracts, gating and configuration sections.

mod config;
mod gate;
mod traits;

pub use config::ConfigSection;
pub use gate::{Gate, Gated};
pub use traits::{
    Component, FrameMapper, FrameReader, FrameTransform, FrameValidator, FrameWriter,
};
