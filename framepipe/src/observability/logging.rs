//! Subscriber installation for pipeline logs.

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable whose filter directives override the configuration.
pub const LOG_ENV_VAR: &str = "FRAMEPIPE_LOG";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level: trace, debug, info, warn, error or off.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Include the event target (module path).
    pub with_target: bool,
    /// Per-module levels, e.g. `framepipe::aggregate` = `debug`.
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            with_target: false,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Builds the filter directives, e.g. `info,framepipe::aggregate=debug`.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        std::iter::once(self.level.clone())
            .chain(modules.into_iter().map(|(module, level)| format!("{module}={level}")))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filter(&self) -> Result<EnvFilter> {
        if let Ok(directives) = std::env::var(LOG_ENV_VAR) {
            if let Ok(filter) = EnvFilter::try_new(&directives) {
                return Ok(filter);
            }
        }
        EnvFilter::try_new(self.directives()).map_err(|e| {
            ConfigError::invalid("logging", "level", format!("{}: {e}", self.directives())).into()
        })
    }
}

/// Installs the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, which is
/// the normal case in tests and when embedding the crate.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let filter = config.filter()?;
    let registry = Registry::default().with(filter);
    let installed = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
            .is_ok(),
    };
    Ok(installed)
}
