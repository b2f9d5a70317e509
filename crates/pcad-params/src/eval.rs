//! Expression Evaluator
//!
//! Evaluates an [`Expr`] against a name-to-value lookup, with the built-in
//! constants `PI`, `E`, `TAU` and a fixed table of math functions.

use std::collections::HashMap;
use std::f64::consts;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{EvalError, ExprError};
use crate::parser::parse;

/// Value of a built-in constant
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "PI" => Some(consts::PI),
        "E" => Some(consts::E),
        "TAU" => Some(consts::TAU),
        _ => None,
    }
}

/// Whether `name` is a registered built-in function
pub fn is_builtin_function(name: &str) -> bool {
    BUILTINS.iter().any(|(n, _)| *n == name)
}

enum Builtin {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Ternary(fn(f64, f64, f64) -> f64),
    /// One or more arguments folded pairwise
    Fold(fn(f64, f64) -> f64),
}

const BUILTINS: &[(&str, Builtin)] = &[
    ("abs", Builtin::Unary(f64::abs)),
    ("floor", Builtin::Unary(f64::floor)),
    ("ceil", Builtin::Unary(f64::ceil)),
    ("round", Builtin::Unary(f64::round)),
    ("sqrt", Builtin::Unary(f64::sqrt)),
    ("pow", Builtin::Binary(f64::powf)),
    ("exp", Builtin::Unary(f64::exp)),
    ("log", Builtin::Unary(f64::ln)),
    ("log10", Builtin::Unary(f64::log10)),
    ("log2", Builtin::Unary(f64::log2)),
    ("sin", Builtin::Unary(f64::sin)),
    ("cos", Builtin::Unary(f64::cos)),
    ("tan", Builtin::Unary(f64::tan)),
    ("asin", Builtin::Unary(f64::asin)),
    ("acos", Builtin::Unary(f64::acos)),
    ("atan", Builtin::Unary(f64::atan)),
    ("atan2", Builtin::Binary(f64::atan2)),
    ("sinh", Builtin::Unary(f64::sinh)),
    ("cosh", Builtin::Unary(f64::cosh)),
    ("tanh", Builtin::Unary(f64::tanh)),
    ("min", Builtin::Fold(f64::min)),
    ("max", Builtin::Fold(f64::max)),
    ("clamp", Builtin::Ternary(clamp)),
    ("deg", Builtin::Unary(f64::to_degrees)),
    ("rad", Builtin::Unary(f64::to_radians)),
];

// f64::clamp panics when lo > hi
fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

fn call(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let (_, builtin) = BUILTINS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;

    let arity = |expected: &'static str| EvalError::Arity {
        name: name.to_string(),
        expected,
        got: args.len(),
    };

    match (builtin, args) {
        (Builtin::Unary(f), [x]) => Ok(f(*x)),
        (Builtin::Unary(_), _) => Err(arity("1")),
        (Builtin::Binary(f), [x, y]) => Ok(f(*x, *y)),
        (Builtin::Binary(_), _) => Err(arity("2")),
        (Builtin::Ternary(f), [x, y, z]) => Ok(f(*x, *y, *z)),
        (Builtin::Ternary(_), _) => Err(arity("3")),
        (Builtin::Fold(f), [first, rest @ ..]) => Ok(rest.iter().fold(*first, |acc, v| f(acc, *v))),
        (Builtin::Fold(_), []) => Err(arity("at least 1")),
    }
}

/// Evaluate `expr`. Identifiers resolve from `vars` first, then the constants.
pub fn evaluate(expr: &Expr, vars: &HashMap<String, f64>) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Ident(name) => vars
            .get(name)
            .copied()
            .or_else(|| constant(name))
            .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
        Expr::Unary { op, arg } => {
            let value = evaluate(arg, vars)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Neg => -value,
            })
        }
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, vars)?;
            let r = evaluate(right, vars)?;
            match op {
                BinaryOp::Add => Ok(l + r),
                BinaryOp::Sub => Ok(l - r),
                BinaryOp::Mul => Ok(l * r),
                BinaryOp::Div if r == 0.0 => Err(EvalError::DivisionByZero),
                BinaryOp::Div => Ok(l / r),
                BinaryOp::Pow => Ok(l.powf(r)),
            }
        }
        Expr::Call { name, args } => {
            // Unknown names fail before their arguments are looked at
            if !is_builtin_function(name) {
                return Err(EvalError::UnknownFunction(name.clone()));
            }
            let values = args
                .iter()
                .map(|arg| evaluate(arg, vars))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &values)
        }
    }
}

/// Parse and evaluate `source`, rejecting NaN and infinite results.
pub fn safe_evaluate(source: &str, vars: &HashMap<String, f64>) -> Result<f64, ExprError> {
    let expr = parse(source)?;
    let value = evaluate(&expr, vars)?;
    if !value.is_finite() {
        return Err(EvalError::NonFinite(value).into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eval(source: &str) -> Result<f64, EvalError> {
        evaluate(&parse(source).unwrap(), &HashMap::new())
    }

    fn vars(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(eval("-2 ^ 2").unwrap(), 4.0);
        assert_eq!(eval("10 / 4").unwrap(), 2.5);
    }

    #[test]
    fn test_constants_and_functions() {
        assert_relative_eq!(eval("PI").unwrap(), consts::PI);
        assert_relative_eq!(eval("TAU / 2").unwrap(), consts::PI);
        assert_relative_eq!(eval("deg(PI)").unwrap(), 180.0);
        assert_relative_eq!(eval("rad(90)").unwrap(), consts::FRAC_PI_2);
        assert_relative_eq!(eval("atan2(1, 1)").unwrap(), consts::FRAC_PI_4);
        assert_eq!(eval("max(3, 9, 4)").unwrap(), 9.0);
        assert_eq!(eval("min(3)").unwrap(), 3.0);
        assert_eq!(eval("clamp(12, 0, 10)").unwrap(), 10.0);
        assert_eq!(eval("log2(8)").unwrap(), 3.0);
    }

    #[test]
    fn test_vars_shadow_constants() {
        let v = vars(&[("width", 20.0), ("PI", 3.0)]);
        assert_eq!(evaluate(&parse("width / 2").unwrap(), &v).unwrap(), 10.0);
        assert_eq!(evaluate(&parse("PI").unwrap(), &v).unwrap(), 3.0);
    }

    #[test]
    fn test_unknown_identifier() {
        assert_eq!(
            eval("height + 1"),
            Err(EvalError::UnknownIdentifier("height".into()))
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            eval("frob(1)"),
            Err(EvalError::UnknownFunction("frob".into()))
        );
    }

    #[test]
    fn test_arity() {
        assert!(matches!(eval("sqrt(1, 2)"), Err(EvalError::Arity { .. })));
        assert!(matches!(eval("max()"), Err(EvalError::Arity { .. })));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 / (2 - 2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_safe_evaluate_rejects_non_finite() {
        let empty = HashMap::new();
        assert!(matches!(
            safe_evaluate("sqrt(-1)", &empty),
            Err(ExprError::Eval(EvalError::NonFinite(_)))
        ));
        assert!(matches!(
            safe_evaluate("0 ^ -1", &empty),
            Err(ExprError::Eval(EvalError::NonFinite(_)))
        ));
        assert!(matches!(
            safe_evaluate("1 +", &empty),
            Err(ExprError::Syntax(_))
        ));
        assert_eq!(safe_evaluate("2 * 21", &empty).unwrap(), 42.0);
    }
}
