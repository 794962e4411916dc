//! Expression evaluation against the job and record contexts.

use super::ast::{BinaryOp, CompareOp, ContextFlag, Expr, FieldPath, PathScope, UnaryOp};
use super::error::{EvalError, ParseError};
use super::functions;
use super::parser;
use crate::context::{Disposition, TransactionContext, TransformContext};
use crate::errors::Result;
use crate::frame::Value;
use std::cmp::Ordering;
use tracing::warn;

/// Evaluates expressions against a job context and, optionally, the current record.
///
/// Without a transaction, view-prefixed paths resolve to nothing and the
/// record flags (`islast`, `transactionError`) read as false.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    context: &'a TransformContext,
    transaction: Option<&'a TransactionContext>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator bound to a job context.
    #[must_use]
    pub const fn new(context: &'a TransformContext) -> Self {
        Self {
            context,
            transaction: None,
        }
    }

    /// Binds the current record.
    #[must_use]
    pub const fn with_transaction(mut self, transaction: &'a TransactionContext) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Parses and evaluates a boolean expression.
    pub fn evaluate_boolean(&self, expression: &str) -> Result<bool> {
        let expr = parser::parse(expression)?;
        Ok(self.test(&expr)?)
    }

    /// Parses and evaluates a numeric expression.
    pub fn evaluate_numeric(&self, expression: &str) -> Result<f64> {
        let expr = parser::parse(expression)?;
        Ok(self.number(&expr)?)
    }

    /// Evaluates a compiled expression as a boolean.
    pub fn test(&self, expr: &Expr) -> Result<bool, EvalError> {
        truthy(&self.evaluate(expr)?)
    }

    /// Evaluates a compiled expression as a number.
    pub fn number(&self, expr: &Expr) -> Result<f64, EvalError> {
        numeric(&self.evaluate(expr)?)
    }

    /// Resolves a field path, returning `None` when the field is absent.
    #[must_use]
    pub fn resolve(&self, path: &FieldPath) -> Option<&'a Value> {
        match path.scope {
            PathScope::View(view) => self.transaction?.view(view)?.get_path(&path.name),
            PathScope::Bare => self
                .transaction
                .and_then(|txn| txn.working().get_path(&path.name))
                .or_else(|| self.symbol(&path.name)),
            PathScope::Symbol => self.symbol(&path.name),
        }
    }

    fn symbol(&self, name: &str) -> Option<&'a Value> {
        let context: &'a TransformContext = self.context;
        let symbols = context.symbols();
        if let Some(value) = symbols.get(name) {
            return Some(value);
        }
        // `job.ErrorState` reaches into a frame-valued symbol.
        for (pos, _) in name.match_indices('.') {
            if let Some(Value::Frame(frame)) = symbols.get(&name[..pos]) {
                if let Some(value) = frame.get_path(&name[pos + 1..]) {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Evaluates a compiled expression to a value.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Field(path) => Ok(self.resolve(path).cloned().unwrap_or_default()),
            Expr::FieldOrText(path) => Ok(self
                .resolve(path)
                .cloned()
                .unwrap_or_else(|| Value::String(path.raw.clone()))),
            Expr::Flag(flag) => Ok(Value::Bool(self.flag(*flag))),
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!truthy(&value)?),
                    UnaryOp::Negate => Value::Float(-numeric(&value)?),
                })
            }
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::CheckField { path, op, operand } => {
                Ok(Value::Bool(self.check_field(path, *op, operand)?))
            }
            Expr::Equals(a, b) => {
                let (a, b) = (self.evaluate(a)?, self.evaluate(b)?);
                let equal = match (a.is_null(), b.is_null()) {
                    (true, true) => true,
                    (false, false) => a.to_text() == b.to_text(),
                    _ => false,
                };
                Ok(Value::Bool(equal))
            }
            Expr::Exists(path) => Ok(Value::Bool(self.resolve(path).is_some())),
            Expr::Empty(path) => Ok(Value::Bool(self.resolve(path).map_or(true, Value::is_blank))),
            Expr::Match { path, pattern } => Ok(Value::Bool(
                self.resolve(path)
                    .filter(|value| !value.is_null())
                    .is_some_and(|value| pattern.is_match(&value.to_text())),
            )),
            Expr::JobStatus { symbol, success } => {
                let in_error = self
                    .context
                    .symbols()
                    .get(symbol)
                    .and_then(Value::as_frame)
                    .and_then(Disposition::error_state_of);
                Ok(Value::Bool(match in_error {
                    Some(in_error) => in_error != *success,
                    None => false,
                }))
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.number(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Float(functions::apply(*function, &values)))
            }
        }
    }

    fn flag(&self, flag: ContextFlag) -> bool {
        match flag {
            ContextFlag::IsLast => self.transaction.is_some_and(TransactionContext::is_last_frame),
            ContextFlag::ContextError => self.context.is_in_error(),
            ContextFlag::TransactionError => {
                self.transaction.is_some_and(TransactionContext::is_in_error)
            }
            ContextFlag::NoRowsProcessed => self.context.rows_processed() == 0,
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, EvalError> {
        match op {
            BinaryOp::And => Ok(Value::Bool(self.test(left)? && self.test(right)?)),
            BinaryOp::Or => Ok(Value::Bool(self.test(left)? || self.test(right)?)),
            BinaryOp::Eq | BinaryOp::NotEq => {
                let (l, r) = (self.evaluate(left)?, self.evaluate(right)?);
                let equal = match (l.is_null(), r.is_null()) {
                    (true, true) => true,
                    (false, false) => l.compare(&r) == Some(Ordering::Equal),
                    _ => false,
                };
                Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let (l, r) = (self.evaluate(left)?, self.evaluate(right)?);
                let holds = l.compare(&r).is_some_and(|ordering| match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                });
                Ok(Value::Bool(holds))
            }
            _ => {
                let (l, r) = (self.number(left)?, self.number(right)?);
                Ok(Value::Float(functions::arithmetic(op, l, r)))
            }
        }
    }

    /// A missing or null field never matches, whatever the operator.
    fn check_field(&self, path: &FieldPath, op: CompareOp, operand: &Expr) -> Result<bool, EvalError> {
        let Some(field) = self.resolve(path).filter(|value| !value.is_null()) else {
            return Ok(false);
        };
        let operand = self.evaluate(operand)?;
        let ordering = if op == CompareOp::EqIgnoreCase {
            (!operand.is_null()).then(|| {
                field
                    .to_text()
                    .to_lowercase()
                    .cmp(&operand.to_text().to_lowercase())
            })
        } else {
            field.compare(&operand)
        };
        let Some(ordering) = ordering else {
            return Ok(false);
        };
        Ok(match op {
            CompareOp::Eq | CompareOp::EqIgnoreCase => ordering == Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Ne => ordering != Ordering::Equal,
        })
    }
}

fn truthy(value: &Value) -> Result<bool, EvalError> {
    if value.is_null() {
        return Ok(false);
    }
    value.as_bool().ok_or_else(|| EvalError::NotBoolean {
        value: value.to_text(),
        type_name: value.type_name(),
    })
}

fn numeric(value: &Value) -> Result<f64, EvalError> {
    value.as_f64().ok_or_else(|| EvalError::NotNumeric {
        value: value.to_text(),
        type_name: value.type_name(),
    })
}

/// An expression compiled once and evaluated many times.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    tree: Expr,
}

impl Expression {
    /// Compiles an expression.
    pub fn compile(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let tree = parser::parse(&source)?;
        Ok(Self { source, tree })
    }

    /// Returns the expression text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compiled tree.
    #[must_use]
    pub const fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Evaluates to a value.
    pub fn evaluate(
        &self,
        context: &TransformContext,
        transaction: Option<&TransactionContext>,
    ) -> Result<Value, EvalError> {
        bind(context, transaction).evaluate(&self.tree)
    }

    /// Evaluates as a boolean.
    pub fn evaluate_boolean(
        &self,
        context: &TransformContext,
        transaction: Option<&TransactionContext>,
    ) -> Result<bool, EvalError> {
        bind(context, transaction).test(&self.tree)
    }

    /// Evaluates as a number.
    pub fn evaluate_numeric(
        &self,
        context: &TransformContext,
        transaction: Option<&TransactionContext>,
    ) -> Result<f64, EvalError> {
        bind(context, transaction).number(&self.tree)
    }
}

fn bind<'a>(
    context: &'a TransformContext,
    transaction: Option<&'a TransactionContext>,
) -> Evaluator<'a> {
    let evaluator = Evaluator::new(context);
    match transaction {
        Some(txn) => evaluator.with_transaction(txn),
        None => evaluator,
    }
}

/// A boolean expression gating a pipeline stage.
#[derive(Debug, Clone)]
pub struct Condition(Expression);

impl Condition {
    /// Compiles a condition.
    pub fn compile(source: impl Into<String>) -> Result<Self, ParseError> {
        Expression::compile(source).map(Self)
    }

    /// Returns the condition text.
    #[must_use]
    pub fn source(&self) -> &str {
        self.0.source()
    }

    /// Evaluates the condition, surfacing evaluation errors.
    pub fn evaluate(
        &self,
        context: &TransformContext,
        transaction: Option<&TransactionContext>,
    ) -> Result<bool, EvalError> {
        self.0.evaluate_boolean(context, transaction)
    }

    /// Returns whether the condition holds; an evaluation error counts as not met.
    #[must_use]
    pub fn is_satisfied(
        &self,
        context: &TransformContext,
        transaction: Option<&TransactionContext>,
    ) -> bool {
        match self.evaluate(context, transaction) {
            Ok(holds) => holds,
            Err(e) => {
                warn!(
                    condition = %self.source(),
                    row = transaction.map(TransactionContext::row),
                    error = %e,
                    "Condition could not be evaluated; treating as not met"
                );
                false
            }
        }
    }
}
