//! Numeric operators and the built-in function library.

use super::ast::{BinaryOp, MathFunction};

/// Applies an arithmetic operator.
///
/// Division and modulo by zero yield positive infinity whatever the dividend.
#[must_use]
pub fn arithmetic(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div | BinaryOp::Mod if right == 0.0 => f64::INFINITY,
        BinaryOp::Div => left / right,
        BinaryOp::Mod => left % right,
        BinaryOp::Pow => left.powf(right),
        _ => f64::NAN,
    }
}

/// Applies a library function to already-evaluated arguments.
///
/// Arity is checked by the parser; an empty slice only reaches the
/// variadic functions through direct calls and yields NaN.
#[must_use]
pub fn apply(function: MathFunction, args: &[f64]) -> f64 {
    let first = args.first().copied().unwrap_or(f64::NAN);
    match function {
        MathFunction::Sin => first.sin(),
        MathFunction::Cos => first.cos(),
        MathFunction::Tan => first.tan(),
        MathFunction::Asin => first.asin(),
        MathFunction::Acos => first.acos(),
        MathFunction::Atan => first.atan(),
        MathFunction::Sinh => first.sinh(),
        MathFunction::Cosh => first.cosh(),
        MathFunction::Tanh => first.tanh(),
        MathFunction::Ln => first.ln(),
        MathFunction::Log => first.log10(),
        MathFunction::Abs => first.abs(),
        MathFunction::Ceil => first.ceil(),
        MathFunction::Floor => first.floor(),
        MathFunction::Round => first.round(),
        MathFunction::Sqrt => first.sqrt(),
        MathFunction::Exp => first.exp(),
        MathFunction::Random => rand::random::<f64>(),
        MathFunction::Min => args.iter().copied().reduce(f64::min).unwrap_or(f64::NAN),
        MathFunction::Max => args.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
        MathFunction::Sum => args.iter().sum(),
        MathFunction::Avg if args.is_empty() => f64::NAN,
        MathFunction::Avg => args.iter().sum::<f64>() / args.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_by_zero_is_positive_infinity() {
        assert_eq!(arithmetic(BinaryOp::Div, 2.0, 0.0), f64::INFINITY);
        assert_eq!(arithmetic(BinaryOp::Div, -2.0, 0.0), f64::INFINITY);
        assert_eq!(arithmetic(BinaryOp::Mod, 5.0, 0.0), f64::INFINITY);
        assert_eq!(arithmetic(BinaryOp::Mod, 5.0, 3.0), 2.0);
    }

    #[test]
    fn test_variadic_functions() {
        let args = [3.0, 1.0, 2.0];
        assert_eq!(apply(MathFunction::Min, &args), 1.0);
        assert_eq!(apply(MathFunction::Max, &args), 3.0);
        assert_eq!(apply(MathFunction::Sum, &args), 6.0);
        assert_eq!(apply(MathFunction::Avg, &args), 2.0);
        assert!(apply(MathFunction::Avg, &[]).is_nan());
    }

    #[test]
    fn test_unary_functions() {
        assert_eq!(apply(MathFunction::Log, &[1000.0]), 3.0);
        assert_eq!(apply(MathFunction::Ln, &[1.0]), 0.0);
        assert_eq!(apply(MathFunction::Abs, &[-4.5]), 4.5);
        assert_eq!(apply(MathFunction::Ceil, &[1.2]), 2.0);
        assert_eq!(apply(MathFunction::Floor, &[1.8]), 1.0);
        assert_eq!(apply(MathFunction::Round, &[2.5]), 3.0);
        assert_eq!(apply(MathFunction::Sqrt, &[16.0]), 4.0);
    }

    #[test]
    fn test_random_is_unit_interval() {
        for _ in 0..100 {
            let r = apply(MathFunction::Random, &[]);
            assert!((0.0..1.0).contains(&r));
        }
    }
}
