//! Error types for the framepipe pipeline.
//!
//! Errors fall into three scopes that are handled differently by the engine:
//! expression errors (logged, condition treated as false), record errors
//! (recorded on the transaction context) and job errors (recorded on the
//! transform context and, under a halt-on-error policy, propagated).

use crate::eval::{EvalError, ParseError};
use std::collections::HashMap;
use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T, E = FramepipeError> = std::result::Result<T, E>;

/// The main error type for framepipe operations.
#[derive(Debug, Error)]
pub enum FramepipeError {
    /// A condition or expression failed to parse.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// An expression failed to evaluate.
    #[error("{0}")]
    Eval(#[from] EvalError),

    /// A configuration value was missing or malformed.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The request bridge could not deliver a request or response.
    #[error("{0}")]
    Bridge(#[from] BridgeError),

    /// A pipeline component failed.
    #[error("Component '{component}' failed: {message}")]
    Component {
        /// The component name.
        component: String,
        /// The failure message.
        message: String,
    },

    /// The job was aborted by a stage configured to halt on error.
    #[error("Job '{job}' halted by '{component}': {message}")]
    JobHalted {
        /// The job name.
        job: String,
        /// The component that halted the job.
        component: String,
        /// The failure message.
        message: String,
    },

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FramepipeError {
    /// Creates a component failure.
    #[must_use]
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Converts to a dictionary representation for structured logging.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        let kind = match self {
            Self::Parse(_) => "ParseError",
            Self::Eval(_) => "EvalError",
            Self::Config(_) => "ConfigError",
            Self::Bridge(_) => "BridgeError",
            Self::Component { component, .. } => {
                map.insert("component".to_string(), serde_json::json!(component));
                "ComponentError"
            }
            Self::JobHalted { job, component, .. } => {
                map.insert("job".to_string(), serde_json::json!(job));
                map.insert("component".to_string(), serde_json::json!(component));
                "JobHalted"
            }
            Self::Internal(_) => "InternalError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        };
        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised while reading component configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required attribute was not configured.
    #[error("Missing required attribute '{attribute}' in section '{section}'")]
    MissingAttribute {
        /// The section name.
        section: String,
        /// The attribute name.
        attribute: String,
    },

    /// An attribute was present but had the wrong type or format.
    #[error("Invalid value for '{attribute}' in section '{section}': {reason}")]
    InvalidValue {
        /// The section name.
        section: String,
        /// The attribute name.
        attribute: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A stage class name did not match any known component.
    #[error("Unknown component class '{0}'")]
    UnknownClass(String),
}

impl ConfigError {
    /// Creates a missing attribute error.
    #[must_use]
    pub fn missing(section: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            section: section.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(
        section: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section: section.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised at the request/response bridge boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The request queue stayed full for the whole enqueue timeout.
    #[error("Request queue full (capacity {capacity})")]
    QueueFull {
        /// The queue capacity.
        capacity: usize,
    },

    /// The engine side of the bridge has shut down.
    #[error("Request bridge closed")]
    Closed,

    /// No response arrived within the response timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    Timeout {
        /// The request ID.
        request_id: String,
        /// The timeout in milliseconds.
        timeout_ms: u64,
    },
}
