//! Error types for expressions and parameters

use std::fmt;

use thiserror::Error;

use crate::env::ParamId;

/// What went wrong while reading an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A character that no token starts with
    UnexpectedChar(char),
    /// A token the grammar does not allow at this point
    UnexpectedToken(String),
    /// Input ended while more was expected
    UnexpectedEnd,
    /// A `(` without its `)`, or a stray `)`
    UnbalancedParen,
    /// A numeric literal too large for an `f64`
    NumberOutOfRange(String),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::UnexpectedChar(c) => write!(f, "Unexpected character '{}'", c),
            SyntaxErrorKind::UnexpectedToken(t) => write!(f, "Unexpected token '{}'", t),
            SyntaxErrorKind::UnexpectedEnd => f.write_str("Unexpected end of input"),
            SyntaxErrorKind::UnbalancedParen => f.write_str("Unbalanced parenthesis"),
            SyntaxErrorKind::NumberOutOfRange(t) => write!(f, "Number out of range '{}'", t),
        }
    }
}

/// Malformed expression text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset into the source
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Failure while evaluating a parsed expression
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function {name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result is not a finite number: {0}")]
    NonFinite(f64),
}

// `f64` payloads compare by bits so a NaN error equals itself
impl PartialEq for EvalError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EvalError::UnknownIdentifier(a), EvalError::UnknownIdentifier(b)) => a == b,
            (EvalError::UnknownFunction(a), EvalError::UnknownFunction(b)) => a == b,
            (
                EvalError::Arity {
                    name: a,
                    expected: ea,
                    got: ga,
                },
                EvalError::Arity {
                    name: b,
                    expected: eb,
                    got: gb,
                },
            ) => a == b && ea == eb && ga == gb,
            (EvalError::DivisionByZero, EvalError::DivisionByZero) => true,
            (EvalError::NonFinite(a), EvalError::NonFinite(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for EvalError {}

/// Either stage of turning source text into a number
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// The topological sort hit a node that was still being visited
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Dependency cycle through '{0}'")]
pub struct CycleError(pub String);

/// Per-parameter failure recorded during an evaluation pass
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamEvalError {
    #[error("{0}")]
    Expression(#[from] ExprError),

    #[error("Circular dependency: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// Rejected parameter edit; the environment is left unchanged
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamEditError {
    #[error("Invalid parameter name: '{0}'")]
    InvalidName(String),

    #[error("A parameter named '{0}' already exists")]
    DuplicateName(String),

    #[error("Parameter not found: {0}")]
    NotFound(ParamId),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Result type for parameter edits
pub type ParamEditResult<T> = Result<T, ParamEditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_errors_equal_themselves() {
        let nan = EvalError::NonFinite(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(nan, EvalError::NonFinite(f64::INFINITY));
        assert_ne!(EvalError::DivisionByZero, EvalError::NonFinite(0.0));
    }
}
