//! Per-stage enablement and conditional execution.

use super::config::ConfigSection;
use super::Component;
use crate::context::{TransactionContext, TransformContext};
use crate::errors::Result;
use crate::eval::{Condition, ParseError};

/// Decides whether a stage runs for a given record.
///
/// The condition text is held until [`Gate::open`] compiles it, so a
/// malformed condition fails when the job starts rather than per record.
#[derive(Debug, Clone)]
pub struct Gate {
    enabled: bool,
    halt_on_error: bool,
    source: Option<String>,
    condition: Option<Condition>,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            enabled: true,
            halt_on_error: false,
            source: None,
            condition: None,
        }
    }
}

impl Gate {
    /// Creates an enabled, unconditional gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `Enabled`, `Condition` and `HaltOnError` from a section.
    pub fn from_config(section: &ConfigSection) -> Result<Self> {
        Ok(Self {
            enabled: section.get_bool("Enabled", true)?,
            halt_on_error: section.get_bool("HaltOnError", false)?,
            source: section.get_str("Condition").filter(|c| !c.trim().is_empty()),
            condition: None,
        })
    }

    /// Sets the condition text.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.source = Some(condition.into());
        self.condition = None;
        self
    }

    /// Enables or disables the stage.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Makes a failure of the stage abort the job.
    #[must_use]
    pub const fn with_halt_on_error(mut self, halt: bool) -> Self {
        self.halt_on_error = halt;
        self
    }

    /// Compiles the condition.
    pub fn open(&mut self) -> std::result::Result<(), ParseError> {
        self.condition = match &self.source {
            Some(source) => Some(Condition::compile(source.as_str())?),
            None => None,
        };
        Ok(())
    }

    /// Returns true if the stage is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true if a failure of the stage halts the job.
    #[must_use]
    pub const fn halt_on_error(&self) -> bool {
        self.halt_on_error
    }

    /// Returns the condition text, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Returns true if the stage should run.
    ///
    /// A disabled stage never runs. A conditional gate that was never
    /// opened never runs either.
    #[must_use]
    pub fn permits(&self, context: &TransformContext, transaction: Option<&TransactionContext>) -> bool {
        if !self.enabled {
            return false;
        }
        match (&self.condition, &self.source) {
            (Some(condition), _) => condition.is_satisfied(context, transaction),
            (None, Some(_)) => false,
            (None, None) => true,
        }
    }
}

/// A component paired with its gate.
#[derive(Debug)]
pub struct Gated<T> {
    inner: T,
    gate: Gate,
}

impl<T> Gated<T> {
    /// Wraps a component with a gate.
    pub const fn new(inner: T, gate: Gate) -> Self {
        Self { inner, gate }
    }

    /// Wraps a component with an always-open gate.
    pub fn ungated(inner: T) -> Self {
        Self::new(inner, Gate::new())
    }

    /// Returns the wrapped component.
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    /// Returns the wrapped component mutably.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Returns the gate.
    pub const fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Unwraps the component.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Returns true if the component should run for this record.
    pub fn permits(&self, context: &TransformContext, transaction: &TransactionContext) -> bool {
        self.gate.permits(context, Some(transaction))
    }
}

impl<T: Component> Component for Gated<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(&mut self, context: &mut TransformContext) -> Result<()> {
        self.gate.open()?;
        self.inner.open(context)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use serde_json::json;

    struct Noop;

    impl Component for Noop {
        fn name(&self) -> &str {
            "noop"
        }
    }

    fn txn(kind: &str) -> TransactionContext {
        TransactionContext::with_source(0, Frame::new().with("kind", kind))
    }

    #[test]
    fn test_unconditional_gate_permits() {
        let ctx = TransformContext::new("job");
        assert!(Gate::new().permits(&ctx, Some(&txn("a"))));
        assert!(!Gate::new().with_enabled(false).permits(&ctx, Some(&txn("a"))));
    }

    #[test]
    fn test_condition_compiled_at_open() {
        let ctx = TransformContext::new("job");
        let mut gate = Gate::new().with_condition("equals(Working.kind, 'a')");

        assert!(!gate.permits(&ctx, Some(&txn("a"))));
        gate.open().unwrap();
        assert!(gate.permits(&ctx, Some(&txn("a"))));
        assert!(!gate.permits(&ctx, Some(&txn("b"))));
    }

    #[test]
    fn test_bad_condition_fails_open() {
        let mut ctx = TransformContext::new("job");
        let mut stage = Gated::new(Noop, Gate::new().with_condition("equals(Working.kind"));

        assert!(stage.open(&mut ctx).is_err());
    }

    #[test]
    fn test_erroring_condition_is_not_met() {
        let ctx = TransformContext::new("job");
        let mut gate = Gate::new().with_condition("Working.kind && true");
        gate.open().unwrap();

        assert!(!gate.permits(&ctx, Some(&txn("not a boolean"))));
    }

    #[test]
    fn test_from_config() {
        let section = ConfigSection::from_value(json!({
            "enabled": "false",
            "haltOnError": true,
            "condition": "islast"
        }))
        .unwrap();
        let gate = Gate::from_config(&section).unwrap();

        assert!(!gate.is_enabled());
        assert!(gate.halt_on_error());
        assert_eq!(gate.condition(), Some("islast"));
    }
}
