//! Built-in pipeline stages.
//!
//! Concrete file, database and network connectors live outside this crate;
//! these stages cover the in-process cases and serve as reference
//! implementations of the stage contracts.

mod map;
mod memory;
mod transform;
mod validate;

pub use map::FieldMapper;
pub use memory::{CollectingWriter, FrameVecReader};
pub use transform::SetTransform;
pub use validate::NotEmptyValidator;
