//! Field presence validation.

use crate::component::{Component, ConfigSection, FrameValidator};
use crate::context::{TransactionContext, TransformContext};
use crate::errors::Result;
use crate::eval::{Evaluator, FieldPath};

/// Rejects records whose field is absent, null or blank.
#[derive(Debug, Clone)]
pub struct NotEmptyValidator {
    name: String,
    field: FieldPath,
}

impl NotEmptyValidator {
    /// Validates `field`, a path such as `Working.id` or `id`.
    #[must_use]
    pub fn new(field: &str) -> Self {
        Self {
            name: "NotEmpty".to_string(),
            field: FieldPath::parse(field),
        }
    }

    /// Reads `Field`.
    pub fn from_config(section: &ConfigSection) -> Result<Self> {
        let mut validator = Self::new(&section.require_str("Field")?);
        if let Some(name) = section.get_str("name") {
            validator.name = name;
        }
        Ok(validator)
    }
}

impl Component for NotEmptyValidator {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameValidator for NotEmptyValidator {
    fn validate(&mut self, context: &TransformContext, transaction: &TransactionContext) -> Result<bool> {
        let value = Evaluator::new(context)
            .with_transaction(transaction)
            .resolve(&self.field);
        Ok(value.is_some_and(|v| !v.is_blank()))
    }

    fn description(&self) -> String {
        format!("'{}' must not be empty", self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, Value};

    #[test]
    fn test_not_empty() {
        let ctx = TransformContext::new("job");
        let mut validator = NotEmptyValidator::new("Working.id");

        let present = TransactionContext::with_source(0, Frame::new().with("id", 7));
        let blank = TransactionContext::with_source(1, Frame::new().with("id", " "));
        let null = TransactionContext::with_source(2, Frame::new().with("id", Value::Null));
        let missing = TransactionContext::with_source(3, Frame::new());

        assert!(validator.validate(&ctx, &present).unwrap());
        assert!(!validator.validate(&ctx, &blank).unwrap());
        assert!(!validator.validate(&ctx, &null).unwrap());
        assert!(!validator.validate(&ctx, &missing).unwrap());
        assert_eq!(validator.description(), "'Working.id' must not be empty");
    }
}
