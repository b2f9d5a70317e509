//! Parametric Expressions and Parameters
//!
//! This crate provides:
//! - An arithmetic expression language (lexer, parser, evaluator)
//! - Built-in math functions and constants
//! - A name-to-name dependency graph with cycle detection
//! - The parameter environment that re-evaluates formulas in dependency order
//! - Dimensions that bind a numeric field to a parameter or formula

pub mod ast;
pub mod dim;
pub mod env;
pub mod error;
pub mod eval;
pub mod graph;
pub mod lexer;
pub mod parser;

// Re-exports for convenience
pub use ast::{BinaryOp, Expr, UnaryOp};
pub use dim::{Dim, eval_dim_value, update_dim_value};
pub use env::{ParamEnv, ParamId, Parameter, evaluate_params, is_valid_name, rename_identifier};
pub use error::{
    CycleError, EvalError, ExprError, ParamEditError, ParamEditResult, ParamEvalError,
    SyntaxError, SyntaxErrorKind,
};
pub use eval::{evaluate, safe_evaluate};
pub use graph::{
    DependencyGraph, build_dependency_graph, detect_cycles, format_cycle, get_dependents,
    topological_sort,
};
pub use parser::{is_valid_expression, parse};
