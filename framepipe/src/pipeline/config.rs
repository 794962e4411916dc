//! Job configuration loaded from JSON.

use crate::component::ConfigSection;
use crate::context::SymbolTable;
use crate::errors::Result;
use crate::observability::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A job definition: symbols plus one [`ConfigSection`] per stage.
///
/// ```json
/// {
///   "name": "trades",
///   "symbols": { "desk": "equities" },
///   "validators": [{ "class": "NotEmpty", "Field": "Working.Symbol" }],
///   "aggregators": [{ "class": "Grouping", "Key": "Symbol", "Limit": 3 }]
/// }
/// ```
///
/// Top-level keys also accept their capitalized spelling (`Name`,
/// `Validators`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// The job name.
    #[serde(alias = "Name")]
    pub name: String,
    /// Initial symbol values.
    #[serde(alias = "Symbols")]
    pub symbols: serde_json::Map<String, serde_json::Value>,
    /// Validator sections, in execution order.
    #[serde(alias = "Validators")]
    pub validators: Vec<ConfigSection>,
    /// Transform sections, in execution order.
    #[serde(alias = "Transforms")]
    pub transforms: Vec<ConfigSection>,
    /// The mapping stage, if any.
    #[serde(alias = "Mapper")]
    pub mapper: Option<ConfigSection>,
    /// Aggregator sections, chained in order.
    #[serde(alias = "Aggregators")]
    pub aggregators: Vec<ConfigSection>,
    /// Logging setup, applied by the caller via
    /// [`init_logging`](crate::observability::init_logging).
    #[serde(alias = "Logging")]
    pub logging: LoggingConfig,
}

impl JobConfig {
    /// Creates an empty configuration for a named job.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds the initial symbol table.
    #[must_use]
    pub fn symbol_table(&self) -> SymbolTable {
        SymbolTable::from_json(&serde_json::Value::Object(self.symbols.clone()))
    }
}
