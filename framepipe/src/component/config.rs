//! Hierarchical configuration sections read by components.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A JSON object of component attributes with case-insensitive lookup.
///
/// `Condition`, `condition` and `CONDITION` all name the same attribute.
/// An exact-case match wins when a section carries several spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSection(Map<String, JsonValue>);

impl ConfigSection {
    /// Creates an empty section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object.
    pub fn from_value(value: JsonValue) -> Result<Self, ConfigError> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(ConfigError::invalid(
                "section",
                "<root>",
                format!("expected an object, found {other}"),
            )),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(attribute.into(), value.into());
        self
    }

    /// Returns the raw attribute value.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&JsonValue> {
        self.0.get(attribute).or_else(|| {
            self.0
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(attribute))
                .map(|(_, value)| value)
        })
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.get(attribute).is_some()
    }

    /// Returns the `class` attribute naming the component type.
    #[must_use]
    pub fn class(&self) -> Option<String> {
        self.get_str("class")
    }

    /// Returns a label for diagnostics: the `name` attribute, else the class.
    #[must_use]
    pub fn label(&self) -> String {
        self.get_str("name")
            .or_else(|| self.class())
            .unwrap_or_else(|| "component".to_string())
    }

    /// Returns an attribute as text. Numbers and booleans are rendered.
    #[must_use]
    pub fn get_str(&self, attribute: &str) -> Option<String> {
        match self.get(attribute)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Returns a boolean attribute, or `default` when absent.
    pub fn get_bool(&self, attribute: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(attribute) {
            None | Some(JsonValue::Null) => Ok(default),
            Some(JsonValue::Bool(b)) => Ok(*b),
            Some(JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(ConfigError::invalid(
                    self.label(),
                    attribute,
                    format!("'{s}' is not a boolean"),
                )),
            },
            Some(other) => Err(ConfigError::invalid(
                self.label(),
                attribute,
                format!("{other} is not a boolean"),
            )),
        }
    }

    /// Returns an integer attribute; text is parsed, other values are errors.
    pub fn get_i64(&self, attribute: &str) -> Result<Option<i64>, ConfigError> {
        let invalid = |shown: String| {
            ConfigError::invalid(self.label(), attribute, format!("'{shown}' is not an integer"))
        };
        match self.get(attribute) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Number(n)) => n.as_i64().map(Some).ok_or_else(|| invalid(n.to_string())),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(s.clone())),
            Some(other) => Err(invalid(other.to_string())),
        }
    }

    /// Returns a required text attribute.
    pub fn require_str(&self, attribute: &str) -> Result<String, ConfigError> {
        self.get_str(attribute)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::missing(self.label(), attribute))
    }

    /// Returns a nested section.
    #[must_use]
    pub fn section(&self, attribute: &str) -> Option<Self> {
        match self.get(attribute)? {
            JsonValue::Object(map) => Some(Self(map.clone())),
            _ => None,
        }
    }

    /// Returns the attribute names.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section() -> ConfigSection {
        ConfigSection::from_value(json!({
            "class": "Grouping",
            "Key": "Symbol",
            "limit": "3",
            "HaltOnError": "yes",
            "Size": 12,
            "Bad": "abc",
            "fields": { "a": "b" }
        }))
        .unwrap()
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let section = section();
        assert_eq!(section.get_str("key"), Some("Symbol".to_string()));
        assert_eq!(section.get_str("CLASS"), Some("Grouping".to_string()));
        assert_eq!(section.class(), Some("Grouping".to_string()));
        assert!(section.contains("Limit"));
        assert!(!section.contains("Sort"));
    }

    #[test]
    fn test_typed_accessors() {
        let section = section();
        assert_eq!(section.get_i64("Limit").unwrap(), Some(3));
        assert_eq!(section.get_i64("size").unwrap(), Some(12));
        assert_eq!(section.get_i64("missing").unwrap(), None);
        assert!(section.get_i64("bad").is_err());
        assert!(section.get_bool("haltonerror", false).unwrap());
        assert!(section.get_bool("enabled", true).unwrap());
        assert!(section.get_bool("bad", true).is_err());
    }

    #[test]
    fn test_nested_sections_and_requirements() {
        let section = section();
        assert_eq!(
            section.section("Fields").and_then(|s| s.get_str("a")),
            Some("b".to_string())
        );
        assert!(section.require_str("Key").is_ok());
        assert!(matches!(
            section.require_str("Field"),
            Err(ConfigError::MissingAttribute { .. })
        ));
        assert!(ConfigSection::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_exact_case_wins() {
        let section = ConfigSection::new().with("limit", 1).with("Limit", 2);
        assert_eq!(section.get_i64("Limit").unwrap(), Some(2));
        assert_eq!(section.get_i64("limit").unwrap(), Some(1));
    }
}
