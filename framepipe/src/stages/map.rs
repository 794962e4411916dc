//! Builds the target frame from working fields.

use crate::component::{Component, ConfigSection, FrameMapper};
use crate::context::{TransactionContext, TransformContext};
use crate::errors::Result;
use crate::frame::Frame;

/// Copies working fields into a new target frame.
///
/// With no field list every working field is copied. Listed fields absent
/// from the working frame are skipped.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    name: String,
    fields: Vec<(String, String)>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self {
            name: "Mapper".to_string(),
            fields: Vec::new(),
        }
    }
}

impl FieldMapper {
    /// Creates a mapper that copies every field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, renamed in the target.
    #[must_use]
    pub fn with_field(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.fields.push((source.into(), target.into()));
        self
    }

    /// Reads `Fields`, an object of working name to target name.
    #[must_use]
    pub fn from_config(section: &ConfigSection) -> Self {
        let mut mapper = Self::new();
        if let Some(name) = section.get_str("name") {
            mapper.name = name;
        }
        if let Some(fields) = section.section("Fields") {
            for source in fields.attributes() {
                let target = fields.get_str(source).unwrap_or_else(|| source.to_string());
                mapper.fields.push((source.to_string(), target));
            }
        }
        mapper
    }
}

impl Component for FieldMapper {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameMapper for FieldMapper {
    fn map(&mut self, _context: &TransformContext, transaction: &mut TransactionContext) -> Result<()> {
        let working = transaction.working();
        let target = if self.fields.is_empty() {
            working.clone()
        } else {
            let mut target = Frame::new();
            for (source, name) in &self.fields {
                if let Some(value) = working.get_path(source) {
                    target.put(name.clone(), value.clone());
                }
            }
            target
        };
        transaction.set_target(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;
    use serde_json::json;

    #[test]
    fn test_copy_all() {
        let ctx = TransformContext::new("job");
        let mut txn = TransactionContext::with_source(0, Frame::new().with("a", 1).with("b", 2));
        FieldMapper::new().map(&ctx, &mut txn).unwrap();

        assert_eq!(txn.target(), Some(txn.working()));
    }

    #[test]
    fn test_rename_from_config() {
        let ctx = TransformContext::new("job");
        let section = ConfigSection::from_value(json!({
            "class": "FieldMapper",
            "fields": { "a": "alpha", "missing": "m" }
        }))
        .unwrap();
        let mut txn = TransactionContext::with_source(0, Frame::new().with("a", 1).with("b", 2));
        FieldMapper::from_config(&section).map(&ctx, &mut txn).unwrap();

        let target = txn.target().unwrap();
        assert_eq!(target.get("alpha"), Some(&Value::Integer(1)));
        assert_eq!(target.len(), 1);
    }
}
