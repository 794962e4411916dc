//! Observability utilities.

mod logging;
mod timer;

pub use logging::{init_logging, LogFormat, LoggingConfig, LOG_ENV_VAR};
pub use timer::JobTimer;
