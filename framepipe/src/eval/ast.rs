//! Expression tree produced by the parser.

use crate::context::FrameView;
use crate::frame::Value;
use regex::Regex;
use std::fmt;

/// Where a field path is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathScope {
    /// One of the transaction's frame views.
    View(FrameView),
    /// No prefix: the working frame, then the symbol table.
    Bare,
    /// A dotted name with an unknown prefix: the symbol table only.
    Symbol,
}

/// A field reference parsed once into a scope and a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Resolution scope.
    pub scope: PathScope,
    /// Field name within the scope; for symbols this is the full name.
    pub name: String,
    /// The path as written.
    pub raw: String,
}

impl FieldPath {
    /// Parses a path such as `Working.address.city`, `count` or `load.ErrorState`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (scope, name) = match raw.split_once('.') {
            Some((prefix, rest)) => match FrameView::from_prefix(prefix) {
                Some(view) => (PathScope::View(view), rest.to_string()),
                None => (PathScope::Symbol, raw.to_string()),
            },
            None => (PathScope::Bare, raw.to_string()),
        };
        Self {
            scope,
            name,
            raw: raw.to_string(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Comparison operators accepted by `checkField`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Equal, ignoring case.
    EqIgnoreCase,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Not equal.
    Ne,
}

impl CompareOp {
    /// Parses an operator name (`EQ`, `EI`, `LT`, `LE`, `GT`, `GE`, `NE`), any case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "EQ" => Some(Self::Eq),
            "EI" => Some(Self::EqIgnoreCase),
            "LT" => Some(Self::Lt),
            "LE" => Some(Self::Le),
            "GT" => Some(Self::Gt),
            "GE" => Some(Self::Ge),
            "NE" => Some(Self::Ne),
            _ => None,
        }
    }
}

/// Flags read from the contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFlag {
    /// `islast`
    IsLast,
    /// `contextError`
    ContextError,
    /// `transactionError`
    TransactionError,
    /// `noRowsProcessed`
    NoRowsProcessed,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Built-in numeric functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Ln,
    Log,
    Min,
    Max,
    Sum,
    Avg,
    Abs,
    Ceil,
    Floor,
    Round,
    Sqrt,
    Exp,
    Random,
}

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many.
    Exact(usize),
    /// At least one.
    Variadic,
}

impl MathFunction {
    /// Looks up a function by name, ignoring case.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let f = match name.to_ascii_lowercase().as_str() {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "min" => Self::Min,
            "max" => Self::Max,
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "abs" => Self::Abs,
            "ceil" => Self::Ceil,
            "floor" => Self::Floor,
            "round" => Self::Round,
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            "random" => Self::Random,
            _ => return None,
        };
        Some(f)
    }

    /// Returns the accepted argument count.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Random => Arity::Exact(0),
            Self::Min | Self::Max | Self::Sum | Self::Avg => Arity::Variadic,
            _ => Arity::Exact(1),
        }
    }
}

/// A compiled expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value.
    Literal(Value),
    /// A field reference; unresolved fields evaluate to null.
    Field(FieldPath),
    /// A field reference that falls back to its own text when unresolved.
    FieldOrText(FieldPath),
    /// A context flag.
    Flag(ContextFlag),
    /// A prefix operation.
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// An infix operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `checkField(path, OP, value)`
    CheckField {
        path: FieldPath,
        op: CompareOp,
        operand: Box<Expr>,
    },
    /// `equals(a, b)`
    Equals(Box<Expr>, Box<Expr>),
    /// `exists(path)`
    Exists(FieldPath),
    /// `empty(path)`
    Empty(FieldPath),
    /// `match(path, pattern)`; the pattern must match the whole value.
    Match { path: FieldPath, pattern: Regex },
    /// `jobSuccess(symbol)` or `jobFailure(symbol)`.
    JobStatus { symbol: String, success: bool },
    /// A numeric library call.
    Call {
        function: MathFunction,
        args: Vec<Expr>,
    },
}
