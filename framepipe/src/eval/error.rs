//! Expression error types.

use std::fmt;
use thiserror::Error;

/// A parse error with the offending position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Byte offset in the expression.
    pub position: usize,
    /// The expression being parsed.
    pub expression: String,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, position: usize, expression: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
            expression: expression.into(),
        }
    }

    /// Formats the error with a caret under the offending position.
    #[must_use]
    pub fn format_error(&self) -> String {
        let pointer = " ".repeat(self.position) + "^";
        format!("{}\n{}\n{}", self, self.expression, pointer)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expression parse error: {} at position {} in '{}'",
            self.message, self.position, self.expression
        )
    }
}

impl std::error::Error for ParseError {}

/// Errors raised while evaluating a compiled expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    /// A numeric operation received a value that is not a number.
    #[error("Expected a number but found {type_name} '{value}'")]
    NotNumeric {
        /// The value's text.
        value: String,
        /// The value's type.
        type_name: &'static str,
    },

    /// A boolean operation received a value that is not a boolean.
    #[error("Expected a boolean but found {type_name} '{value}'")]
    NotBoolean {
        /// The value's text.
        value: String,
        /// The value's type.
        type_name: &'static str,
    },
}
