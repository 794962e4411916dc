//! Pratt parser for the expression language.
//!
//! Function names are resolved while parsing, so an unknown function or a
//! bad argument list fails here rather than on the first record.

use super::ast::{
    Arity, BinaryOp, CompareOp, ContextFlag, Expr, FieldPath, MathFunction, UnaryOp,
};
use super::error::ParseError;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::frame::Value;
use regex::Regex;

/// Deepest nesting of sub-expressions a condition may use.
const MAX_DEPTH: usize = 256;

/// Binding power of operators, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Power,
}

impl Precedence {
    const fn of(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::Or => Self::Or,
            TokenKind::And => Self::And,
            TokenKind::Eq | TokenKind::NotEq => Self::Equals,
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Self::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Self::Sum,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Self::Product,
            TokenKind::Caret => Self::Power,
            _ => Self::Lowest,
        }
    }
}

/// Parses an expression string into an expression tree.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression(Precedence::Lowest)?;
    let trailing = parser.current();
    if trailing.kind != TokenKind::Eof {
        return Err(parser.error_at(trailing, format!("Unexpected token '{}'", trailing.kind)));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn current(&self) -> &Token {
        // The token list always ends with Eof and the cursor never passes it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(message, token.position, self.input)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        let token = self.advance();
        if &token.kind == kind {
            Ok(token)
        } else {
            Err(self.error_at(
                &token,
                format!("Expected '{}' but found '{}'", kind, token.kind),
            ))
        }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_at(
                self.current(),
                format!("Expression nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        let result = self.parse_operators(precedence);
        self.depth -= 1;
        result
    }

    fn parse_operators(&mut self, precedence: Precedence) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;
        loop {
            let next = Precedence::of(&self.current().kind);
            if next <= precedence {
                // `^` is right-associative: an equal binding power still nests.
                if !(next == Precedence::Power && precedence == Precedence::Power) {
                    break;
                }
            }
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::Or => BinaryOp::Or,
            TokenKind::And => BinaryOp::And,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::Caret => BinaryOp::Pow,
            ref other => {
                return Err(self.error_at(&token, format!("Unexpected token '{other}'")));
            }
        };
        let right = self.parse_expression(Precedence::of(&token.kind))?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(i) => Ok(Expr::Literal(Value::Integer(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s))),
            TokenKind::Not => Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_expression(Precedence::Prefix)?),
            }),
            TokenKind::Minus => Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(self.parse_expression(Precedence::Prefix)?),
            }),
            TokenKind::LParen => {
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(ref name) => {
                if self.current().kind == TokenKind::LParen {
                    self.parse_call(&token, name)
                } else {
                    Ok(Self::parse_identifier(name))
                }
            }
            ref other => Err(self.error_at(&token, format!("Unexpected token '{other}'"))),
        }
    }

    fn parse_identifier(name: &str) -> Expr {
        match name {
            "true" => Expr::Literal(Value::Bool(true)),
            "false" => Expr::Literal(Value::Bool(false)),
            "null" => Expr::Literal(Value::Null),
            "pi" => Expr::Literal(Value::Float(std::f64::consts::PI)),
            "e" => Expr::Literal(Value::Float(std::f64::consts::E)),
            "islast" => Expr::Flag(ContextFlag::IsLast),
            "contextError" => Expr::Flag(ContextFlag::ContextError),
            "transactionError" => Expr::Flag(ContextFlag::TransactionError),
            "noRowsProcessed" => Expr::Flag(ContextFlag::NoRowsProcessed),
            _ => Expr::Field(FieldPath::parse(name)),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current().kind == TokenKind::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(Precedence::Lowest)?);
            let token = self.advance();
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RParen => return Ok(args),
                ref other => {
                    return Err(self.error_at(
                        &token,
                        format!("Expected ',' or ')' but found '{other}'"),
                    ));
                }
            }
        }
    }

    fn parse_call(&mut self, token: &Token, name: &str) -> Result<Expr, ParseError> {
        let args = self.parse_arguments()?;
        let lowered = name.to_ascii_lowercase();
        let expect_args = |count: usize| -> Result<(), ParseError> {
            if args.len() == count {
                Ok(())
            } else {
                Err(self.error_at(
                    token,
                    format!("{name}() takes {count} argument(s) but {} were given", args.len()),
                ))
            }
        };

        match lowered.as_str() {
            "checkfield" => {
                expect_args(3)?;
                let mut args = args.into_iter();
                let (Some(path), Some(op), Some(operand)) = (args.next(), args.next(), args.next())
                else {
                    return Err(self.error_at(token, "checkField() takes 3 arguments"));
                };
                let path = self.field_path(token, name, path)?;
                let op_name = match op {
                    Expr::Field(p) => p.raw,
                    Expr::Literal(Value::String(s)) => s,
                    _ => String::new(),
                };
                let op = CompareOp::parse(&op_name).ok_or_else(|| {
                    self.error_at(token, format!("Unknown checkField operator '{op_name}'"))
                })?;
                let operand = match operand {
                    Expr::Field(p) => Expr::FieldOrText(p),
                    other => other,
                };
                Ok(Expr::CheckField {
                    path,
                    op,
                    operand: Box::new(operand),
                })
            }
            "equals" => {
                expect_args(2)?;
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(a), Some(b)) => Ok(Expr::Equals(Box::new(a), Box::new(b))),
                    _ => Err(self.error_at(token, "equals() takes 2 arguments")),
                }
            }
            "exists" | "empty" => {
                expect_args(1)?;
                let path = match args.into_iter().next() {
                    Some(arg) => self.field_path(token, name, arg)?,
                    None => return Err(self.error_at(token, format!("{name}() takes 1 argument"))),
                };
                Ok(if lowered == "exists" {
                    Expr::Exists(path)
                } else {
                    Expr::Empty(path)
                })
            }
            "match" => {
                expect_args(2)?;
                let mut args = args.into_iter();
                let (Some(path), Some(pattern)) = (args.next(), args.next()) else {
                    return Err(self.error_at(token, "match() takes 2 arguments"));
                };
                let path = self.field_path(token, name, path)?;
                let Expr::Literal(Value::String(pattern)) = pattern else {
                    return Err(self.error_at(token, "match() pattern must be a quoted string"));
                };
                let pattern = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                    self.error_at(token, format!("Invalid pattern '{pattern}': {e}"))
                })?;
                Ok(Expr::Match { path, pattern })
            }
            "jobsuccess" | "jobfailure" => {
                expect_args(1)?;
                let symbol = match args.into_iter().next() {
                    Some(Expr::Field(p)) => p.raw,
                    Some(Expr::Literal(Value::String(s))) => s,
                    _ => {
                        return Err(self.error_at(
                            token,
                            format!("{name}() expects a job symbol name"),
                        ));
                    }
                };
                Ok(Expr::JobStatus {
                    symbol,
                    success: lowered == "jobsuccess",
                })
            }
            _ => {
                let function = MathFunction::lookup(name).ok_or_else(|| {
                    self.error_at(token, format!("Unknown function '{name}'"))
                })?;
                match function.arity() {
                    Arity::Exact(count) => expect_args(count)?,
                    Arity::Variadic if args.is_empty() => {
                        return Err(self.error_at(
                            token,
                            format!("{name}() requires at least one argument"),
                        ));
                    }
                    Arity::Variadic => {}
                }
                Ok(Expr::Call { function, args })
            }
        }
    }

    fn field_path(&self, token: &Token, function: &str, arg: Expr) -> Result<FieldPath, ParseError> {
        match arg {
            Expr::Field(path) => Ok(path),
            Expr::Literal(Value::String(s)) => Ok(FieldPath::parse(&s)),
            _ => Err(self.error_at(
                token,
                format!("{function}() expects a field path as its first argument"),
            )),
        }
    }
}
