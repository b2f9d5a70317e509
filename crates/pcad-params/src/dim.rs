//! Dimensions
//!
//! A numeric field of an operation (extrude depth, fillet radius, ...). It is
//! bound to a parameter, driven by its own formula, or a plain literal.

use serde::{Deserialize, Serialize};

use crate::env::{ParamEnv, ParamId, rename_identifier};
use crate::error::SyntaxError;
use crate::eval::safe_evaluate;
use crate::parser::parse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dim {
    /// Last stored literal or evaluated value
    pub value: f64,
    /// Formula evaluated against the parameter lookup
    #[serde(default)]
    pub expression: Option<String>,
    /// Parameter whose value drives this dimension
    #[serde(default)]
    pub param: Option<ParamId>,
}

impl Default for Dim {
    fn default() -> Self {
        Self::literal(0.0)
    }
}

impl Dim {
    pub fn literal(value: f64) -> Self {
        Self {
            value,
            expression: None,
            param: None,
        }
    }

    /// A formula dimension, with `value` as the fallback until it evaluates
    pub fn expression(expression: impl Into<String>, value: f64) -> Self {
        Self {
            value,
            expression: Some(expression.into()),
            param: None,
        }
    }

    pub fn bound(param: ParamId, value: f64) -> Self {
        Self {
            value,
            expression: None,
            param: Some(param),
        }
    }

    /// Rewrite a formula after parameter `old` was renamed to `new`
    pub fn rename_reference(&mut self, old: &str, new: &str) {
        if let Some(expr) = &mut self.expression {
            *expr = rename_identifier(expr, old, new);
        }
    }

    /// Text to show in an input field
    pub fn source_text(&self, env: &ParamEnv) -> String {
        if let Some(p) = self.param.and_then(|id| env.get(id)) {
            return p.name.clone();
        }
        match &self.expression {
            Some(expr) => expr.clone(),
            None => self.value.to_string(),
        }
    }
}

/// Resolve a dimension: bound parameter, then own formula, then stored value.
pub fn eval_dim_value(dim: &Dim, env: &ParamEnv) -> f64 {
    if let Some(p) = dim.param.and_then(|id| env.get(id)) {
        return p.value;
    }
    if let Some(expr) = &dim.expression {
        match safe_evaluate(expr, &env.lookup()) {
            Ok(value) => return value,
            Err(e) => tracing::debug!("Dimension '{}' falls back to {}: {}", expr, dim.value, e),
        }
    }
    dim.value
}

/// Turn user input into a dimension.
///
/// A number becomes a literal, the exact name of a parameter binds to it, and
/// anything else is kept as a formula and evaluated now.
pub fn update_dim_value(dim: &Dim, input: &str, env: &ParamEnv) -> Result<Dim, SyntaxError> {
    let input = input.trim();

    if let Ok(value) = input.parse::<f64>()
        && value.is_finite()
    {
        return Ok(Dim::literal(value));
    }

    if let Some(p) = env.get_by_name(input) {
        return Ok(Dim::bound(p.id, p.value));
    }

    parse(input)?;
    let value = safe_evaluate(input, &env.lookup()).unwrap_or(dim.value);
    Ok(Dim::expression(input, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn env() -> ParamEnv {
        let (env, _) = ParamEnv::new().add_param("depth", "12", None).unwrap();
        env
    }

    #[test]
    fn test_bound_parameter_wins() {
        let env = env();
        let id = env.get_by_name("depth").unwrap().id;
        let dim = Dim {
            value: 1.0,
            expression: Some("99".into()),
            param: Some(id),
        };
        assert_eq!(eval_dim_value(&dim, &env), 12.0);
    }

    #[test]
    fn test_expression_then_literal() {
        let env = env();
        assert_eq!(eval_dim_value(&Dim::expression("depth / 4", 0.0), &env), 3.0);
        // Unknown identifier falls back to stored value
        assert_eq!(eval_dim_value(&Dim::expression("nope", 7.0), &env), 7.0);
        assert_eq!(eval_dim_value(&Dim::literal(5.5), &env), 5.5);
    }

    #[test]
    fn test_missing_parameter_falls_through() {
        let env = env();
        let dim = Dim::bound(ParamId::new(), 2.0);
        assert_eq!(eval_dim_value(&dim, &env), 2.0);
    }

    #[test]
    fn test_update_dim_value() {
        let env = env();
        let base = Dim::literal(1.0);

        assert_eq!(update_dim_value(&base, " 2.5 ", &env).unwrap(), Dim::literal(2.5));

        let bound = update_dim_value(&base, "depth", &env).unwrap();
        assert_eq!(bound.param, env.get_by_name("depth").map(|p| p.id));
        assert_eq!(bound.value, 12.0);

        let formula = update_dim_value(&base, "depth * PI", &env).unwrap();
        assert_eq!(formula.expression.as_deref(), Some("depth * PI"));
        assert_relative_eq!(formula.value, 12.0 * std::f64::consts::PI);

        assert!(update_dim_value(&base, "depth *", &env).is_err());
    }

    #[test]
    fn test_rename_reference() {
        let mut dim = Dim::expression("d + d2", 0.0);
        dim.rename_reference("d", "depth");
        assert_eq!(dim.expression.as_deref(), Some("depth + d2"));
    }
}
