//! Sets a working field from a literal, a symbol template or an expression.

use crate::component::{Component, ConfigSection, FrameTransform};
use crate::context::{TransactionContext, TransformContext};
use crate::errors::{ConfigError, FramepipeError, Result};
use crate::eval::Expression;
use crate::frame::Value;

#[derive(Debug, Clone)]
enum Source {
    Literal(String),
    Template(String),
    Expression(Expression),
}

/// Writes one field of the working frame.
///
/// A `Value` containing `[#name#]` tokens is resolved against the symbol
/// table on every record; an `Expression` is compiled once and evaluated
/// numerically.
#[derive(Debug, Clone)]
pub struct SetTransform {
    name: String,
    field: String,
    source: Source,
}

impl SetTransform {
    /// Sets `field` to a literal or template value.
    #[must_use]
    pub fn value(field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let source = if value.contains("[#") {
            Source::Template(value)
        } else {
            Source::Literal(value)
        };
        Self {
            name: "Set".to_string(),
            field: field.into(),
            source,
        }
    }

    /// Sets `field` to the result of a numeric expression.
    pub fn expression(field: impl Into<String>, expression: &str) -> Result<Self> {
        Ok(Self {
            name: "Set".to_string(),
            field: field.into(),
            source: Source::Expression(Expression::compile(expression)?),
        })
    }

    /// Reads `Field` and one of `Value` or `Expression`.
    pub fn from_config(section: &ConfigSection) -> Result<Self> {
        let field = section.require_str("Field")?;
        let mut transform = if let Some(expression) = section.get_str("Expression") {
            Self::expression(field, &expression)?
        } else if let Some(value) = section.get_str("Value") {
            Self::value(field, value)
        } else {
            return Err(ConfigError::missing(section.label(), "Value").into());
        };
        if let Some(name) = section.get_str("name") {
            transform.name = name;
        }
        Ok(transform)
    }
}

impl Component for SetTransform {
    fn name(&self) -> &str {
        &self.name
    }
}

impl FrameTransform for SetTransform {
    fn process(&mut self, context: &TransformContext, transaction: &mut TransactionContext) -> Result<()> {
        let value = match &self.source {
            Source::Literal(text) => Value::String(text.clone()),
            Source::Template(template) => Value::String(context.symbols().resolve_template(template)),
            Source::Expression(expression) => {
                let number = expression
                    .evaluate_numeric(context, Some(transaction))
                    .map_err(|e| FramepipeError::component(&self.name, e.to_string()))?;
                Value::Float(number)
            }
        };
        transaction.working_mut().put(self.field.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use serde_json::json;

    #[test]
    fn test_literal_and_template() {
        let ctx = TransformContext::new("job").with_symbol("region", "EMEA");
        let mut txn = TransactionContext::with_source(0, Frame::new());

        SetTransform::value("kind", "fixed").process(&ctx, &mut txn).unwrap();
        SetTransform::value("label", "[#region#]-1").process(&ctx, &mut txn).unwrap();

        assert_eq!(txn.working().get("kind"), Some(&Value::from("fixed")));
        assert_eq!(txn.working().get("label"), Some(&Value::from("EMEA-1")));
        assert!(txn.source().is_empty());
    }

    #[test]
    fn test_expression() {
        let ctx = TransformContext::new("job");
        let mut txn = TransactionContext::with_source(0, Frame::new().with("qty", 3).with("price", 2.5));

        let mut total = SetTransform::expression("total", "Working.qty * Working.price").unwrap();
        total.process(&ctx, &mut txn).unwrap();

        assert_eq!(txn.working().get("total"), Some(&Value::Float(7.5)));
    }

    #[test]
    fn test_expression_error_is_component_error() {
        let ctx = TransformContext::new("job");
        let mut txn = TransactionContext::with_source(0, Frame::new().with("qty", "many"));

        let mut total = SetTransform::expression("total", "Working.qty * 2").unwrap();
        let err = total.process(&ctx, &mut txn).unwrap_err();
        assert!(matches!(err, FramepipeError::Component { .. }));
    }

    #[test]
    fn test_from_config() {
        let section = ConfigSection::from_value(json!({"class": "Set", "field": "x"})).unwrap();
        assert!(SetTransform::from_config(&section).is_err());

        let section =
            ConfigSection::from_value(json!({"class": "Set", "field": "x", "expression": "1 +"}))
                .unwrap();
        assert!(matches!(
            SetTransform::from_config(&section),
            Err(FramepipeError::Parse(_))
        ));
    }
}
