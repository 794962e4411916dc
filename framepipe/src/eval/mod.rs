//! Expression language for stage conditions and computed values.
//!
//! Expressions are tokenized, parsed with a Pratt parser into an [`Expr`]
//! tree and evaluated against a [`TransformContext`](crate::context::TransformContext)
//! and, when one is bound, the current
//! [`TransactionContext`](crate::context::TransactionContext).
//!
//! ```text
//! islast || checkField(Working.record_type, EQ, 22)
//! exists(Source.id) && !transactionError
//! sqrt(Working.x ^ 2 + Working.y ^ 2)
//! ```

mod ast;
mod error;
mod evaluator;
mod functions;
mod lexer;
mod parser;
mod token;

pub use ast::{
    Arity, BinaryOp, CompareOp, ContextFlag, Expr, FieldPath, MathFunction, PathScope, UnaryOp,
};
pub use error::{EvalError, ParseError};
pub use evaluator::{Condition, Evaluator, Expression};
pub use parser::parse;
