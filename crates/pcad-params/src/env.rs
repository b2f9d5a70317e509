//! Parameter Environment
//!
//! The authoritative set of named parameters. Every edit returns a new,
//! fully re-evaluated environment and leaves the original untouched.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParamEditError, ParamEditResult, ParamEvalError};
use crate::eval::safe_evaluate;
use crate::graph::{build_dependency_graph, detect_cycles, topological_sort};
use crate::parser::parse;

/// Unique identifier of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(pub Uuid);

impl ParamId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace whole-word occurrences of identifier `old` in `source` with `new`.
///
/// `wx` is left alone when renaming `w`, and so is a call `w(..)`, which
/// names a function rather than the parameter.
pub fn rename_identifier(source: &str, old: &str, new: &str) -> String {
    match Regex::new(&format!(r"\b{}\b", regex::escape(old))) {
        Ok(re) => re
            .replace_all(source, |caps: &regex::Captures<'_>| match caps.get(0) {
                Some(m) if source[m.end()..].trim_start().starts_with('(') => {
                    m.as_str().to_string()
                }
                _ => new.to_string(),
            })
            .into_owned(),
        Err(e) => {
            tracing::warn!("Cannot rewrite references to {}: {}", old, e);
            source.to_string()
        }
    }
}

/// A named, formula-driven value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ParamId,
    /// User-facing identifier, unique within an environment
    pub name: String,
    /// Source formula
    pub expression: String,
    /// Last successfully evaluated value
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id: ParamId::new(),
            name: name.into(),
            expression: expression.into(),
            value: 0.0,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Persisted form: only the parameters, errors are re-derived on load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParamEnvData {
    params: Vec<Parameter>,
}

impl From<ParamEnv> for ParamEnvData {
    fn from(env: ParamEnv) -> Self {
        Self { params: env.params }
    }
}

impl From<ParamEnvData> for ParamEnv {
    fn from(data: ParamEnvData) -> Self {
        ParamEnv {
            params: data.params,
            errors: HashMap::new(),
        }
        .evaluate()
    }
}

/// Ordered parameters plus the errors of the last evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "ParamEnvData", from = "ParamEnvData")]
pub struct ParamEnv {
    /// Parameters in insertion order
    params: Vec<Parameter>,
    /// Per-parameter failures, replaced on every evaluation
    errors: HashMap<ParamId, ParamEvalError>,
}

impl ParamEnv {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an environment from existing parameters and evaluate it
    pub fn from_params(params: Vec<Parameter>) -> Self {
        ParamEnv {
            params,
            errors: HashMap::new(),
        }
        .evaluate()
    }

    #[cfg(test)]
    pub(crate) fn from_expressions<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::from_params(
            pairs
                .into_iter()
                .map(|(name, expr)| Parameter::new(name, expr))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Get a parameter by ID
    pub fn get(&self, id: ParamId) -> Option<&Parameter> {
        self.params.iter().find(|p| p.id == id)
    }

    /// Get a parameter by name
    pub fn get_by_name(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Current values keyed by name, for evaluating formulas outside the environment
    pub fn lookup(&self) -> HashMap<String, f64> {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.value))
            .collect()
    }

    /// Error recorded for a parameter by the last evaluation
    pub fn error(&self, id: ParamId) -> Option<&ParamEvalError> {
        self.errors.get(&id)
    }

    pub fn errors(&self) -> &HashMap<ParamId, ParamEvalError> {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn index_of(&self, id: ParamId) -> ParamEditResult<usize> {
        self.params
            .iter()
            .position(|p| p.id == id)
            .ok_or(ParamEditError::NotFound(id))
    }

    fn check_name(&self, name: &str, except: Option<ParamId>) -> ParamEditResult<()> {
        if !is_valid_name(name) {
            return Err(ParamEditError::InvalidName(name.to_string()));
        }
        if self
            .params
            .iter()
            .any(|p| p.name == name && Some(p.id) != except)
        {
            return Err(ParamEditError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Re-evaluate every parameter in dependency order.
    ///
    /// A failing parameter keeps its previous value, records an error and
    /// contributes 0 to its dependents. On a cycle, the parameters on the
    /// reported path get a cycle error and nothing is re-evaluated.
    pub fn evaluate(&self) -> ParamEnv {
        let mut out = ParamEnv {
            params: self.params.clone(),
            errors: HashMap::new(),
        };

        let graph = build_dependency_graph(&out);
        let order = match topological_sort(&graph) {
            Ok(order) => order,
            Err(cycle) => {
                let path = detect_cycles(&out).unwrap_or_else(|| vec![cycle.0.clone()]);
                tracing::debug!("Parameter cycle: {}", path.join(" -> "));
                for param in &out.params {
                    if path.contains(&param.name) {
                        out.errors.insert(
                            param.id,
                            ParamEvalError::Cycle { path: path.clone() },
                        );
                    }
                }
                return out;
            }
        };

        let index: HashMap<String, usize> = out
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();

        let mut lookup: HashMap<String, f64> = HashMap::with_capacity(order.len());
        for name in order {
            let Some(&i) = index.get(&name) else {
                continue;
            };
            let param = &mut out.params[i];
            match safe_evaluate(&param.expression, &lookup) {
                Ok(value) => {
                    param.value = value;
                    lookup.insert(name, value);
                }
                Err(e) => {
                    out.errors.insert(param.id, e.into());
                    lookup.insert(name, 0.0);
                }
            }
        }

        tracing::debug!(
            "Evaluated {} parameters, {} errors",
            out.params.len(),
            out.errors.len()
        );
        out
    }

    /// Add a parameter, returning the new environment and the parameter's ID
    pub fn add_param(
        &self,
        name: &str,
        expression: &str,
        unit: Option<String>,
    ) -> ParamEditResult<(ParamEnv, ParamId)> {
        self.check_name(name, None)?;
        parse(expression)?;

        let mut param = Parameter::new(name, expression);
        param.unit = unit;
        let id = param.id;

        let mut params = self.params.clone();
        params.push(param);
        Ok((Self::from_params(params), id))
    }

    /// Replace a parameter's formula
    pub fn update_param_expression(&self, id: ParamId, expression: &str) -> ParamEditResult<ParamEnv> {
        let i = self.index_of(id)?;
        parse(expression)?;

        let mut params = self.params.clone();
        params[i].expression = expression.to_string();
        Ok(Self::from_params(params))
    }

    /// Rename a parameter and rewrite every other formula that references it
    pub fn update_param_name(&self, id: ParamId, new_name: &str) -> ParamEditResult<ParamEnv> {
        let i = self.index_of(id)?;
        self.check_name(new_name, Some(id))?;

        let old_name = self.params[i].name.clone();
        let mut params = self.params.clone();
        for (j, param) in params.iter_mut().enumerate() {
            if j == i {
                param.name = new_name.to_string();
            } else {
                param.expression = rename_identifier(&param.expression, &old_name, new_name);
            }
        }
        Ok(Self::from_params(params))
    }

    /// Change the display unit of a parameter
    pub fn update_param_unit(&self, id: ParamId, unit: Option<String>) -> ParamEditResult<ParamEnv> {
        let i = self.index_of(id)?;
        let mut params = self.params.clone();
        params[i].unit = unit;
        Ok(Self::from_params(params))
    }

    /// Remove a parameter. Formulas that referenced it will report an unknown identifier.
    pub fn remove_param(&self, id: ParamId) -> ParamEditResult<ParamEnv> {
        let i = self.index_of(id)?;
        let mut params = self.params.clone();
        params.remove(i);
        Ok(Self::from_params(params))
    }
}

/// Free-function form of [`ParamEnv::evaluate`]
pub fn evaluate_params(env: &ParamEnv) -> ParamEnv {
    env.evaluate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, ExprError};

    fn value(env: &ParamEnv, name: &str) -> f64 {
        env.get_by_name(name).unwrap().value
    }

    fn id(env: &ParamEnv, name: &str) -> ParamId {
        env.get_by_name(name).unwrap().id
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("width"));
        assert!(is_valid_name("_w2"));
        assert!(!is_valid_name("2w"));
        assert!(!is_valid_name("w-x"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_dependency_order_independent_of_insertion() {
        let env = ParamEnv::from_expressions([("c", "b * 2"), ("b", "a + 1"), ("a", "1")]);
        assert_eq!(value(&env, "a"), 1.0);
        assert_eq!(value(&env, "b"), 2.0);
        assert_eq!(value(&env, "c"), 4.0);
        assert!(!env.has_errors());
    }

    #[test]
    fn test_cycle_marks_members_only() {
        let env = ParamEnv::from_expressions([("x", "y + 1"), ("y", "x + 1"), ("z", "3")]);
        assert!(matches!(
            env.error(id(&env, "x")),
            Some(ParamEvalError::Cycle { .. })
        ));
        assert!(matches!(
            env.error(id(&env, "y")),
            Some(ParamEvalError::Cycle { .. })
        ));
        assert!(env.error(id(&env, "z")).is_none());
        // Nothing is re-evaluated while the cycle exists
        assert_eq!(value(&env, "x"), 0.0);
        assert_eq!(value(&env, "z"), 0.0);

        let message = env.error(id(&env, "x")).unwrap().to_string();
        assert!(message.contains("x -> y -> x"));
    }

    #[test]
    fn test_cycle_keeps_stale_values() {
        let env = ParamEnv::from_expressions([("x", "5"), ("y", "x + 1")]);
        assert_eq!(value(&env, "y"), 6.0);

        let env = env.update_param_expression(id(&env, "x"), "y + 1").unwrap();
        assert_eq!(value(&env, "x"), 5.0);
        assert_eq!(value(&env, "y"), 6.0);
        assert_eq!(env.errors().len(), 2);
    }

    #[test]
    fn test_failed_parameter_falls_back_to_zero() {
        let env = ParamEnv::from_expressions([("a", "1/0"), ("b", "a + 5")]);
        assert_eq!(
            env.error(id(&env, "a")),
            Some(&ParamEvalError::Expression(ExprError::Eval(
                EvalError::DivisionByZero
            )))
        );
        assert_eq!(value(&env, "b"), 5.0);
        assert!(env.error(id(&env, "b")).is_none());
    }

    #[test]
    fn test_errors_cleared_after_fix() {
        let env = ParamEnv::from_expressions([("a", "missing * 2")]);
        assert!(env.has_errors());
        let env = env.update_param_expression(id(&env, "a"), "4").unwrap();
        assert!(!env.has_errors());
        assert_eq!(value(&env, "a"), 4.0);
    }

    #[test]
    fn test_add_param_is_pure() {
        let env = ParamEnv::new();
        let (next, pid) = env.add_param("width", "20", Some("mm".into())).unwrap();
        assert!(env.is_empty());
        assert_eq!(next.get(pid).unwrap().value, 20.0);
        assert_eq!(next.get(pid).unwrap().unit.as_deref(), Some("mm"));
    }

    #[test]
    fn test_add_param_rejects_bad_input() {
        let (env, _) = ParamEnv::new().add_param("w", "1", None).unwrap();
        assert_eq!(
            env.add_param("w", "2", None).unwrap_err(),
            ParamEditError::DuplicateName("w".into())
        );
        assert!(matches!(
            env.add_param("9lives", "2", None),
            Err(ParamEditError::InvalidName(_))
        ));
        assert!(matches!(
            env.add_param("h", "2 +", None),
            Err(ParamEditError::Syntax(_))
        ));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_update_expression_syntax_error_leaves_env() {
        let env = ParamEnv::from_expressions([("a", "1")]);
        let err = env.update_param_expression(id(&env, "a"), "1 + (2").unwrap_err();
        assert!(matches!(err, ParamEditError::Syntax(_)));
        assert_eq!(env.get_by_name("a").unwrap().expression, "1");
    }

    #[test]
    fn test_rename_rewrites_whole_words() {
        let env = ParamEnv::from_expressions([
            ("w", "10"),
            ("wx", "3"),
            ("area", "w * wx + w"),
        ]);
        let env = env.update_param_name(id(&env, "w"), "width").unwrap();
        assert_eq!(env.get_by_name("area").unwrap().expression, "width * wx + width");
        assert_eq!(env.get_by_name("wx").unwrap().expression, "3");
        assert_eq!(value(&env, "area"), 40.0);
        assert!(env.get_by_name("w").is_none());
    }

    #[test]
    fn test_rename_collision() {
        let env = ParamEnv::from_expressions([("a", "1"), ("b", "2")]);
        assert_eq!(
            env.update_param_name(id(&env, "a"), "b").unwrap_err(),
            ParamEditError::DuplicateName("b".into())
        );
        // Renaming to its own name is allowed
        assert!(env.update_param_name(id(&env, "a"), "a").is_ok());
    }

    #[test]
    fn test_remove_param() {
        let env = ParamEnv::from_expressions([("a", "2"), ("b", "a * 3")]);
        let env = env.remove_param(id(&env, "a")).unwrap();
        assert_eq!(env.len(), 1);
        assert!(matches!(
            env.error(id(&env, "b")),
            Some(ParamEvalError::Expression(ExprError::Eval(
                EvalError::UnknownIdentifier(_)
            )))
        ));
        assert!(matches!(
            env.remove_param(ParamId::new()),
            Err(ParamEditError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename_identifier() {
        assert_eq!(rename_identifier("w+w2*w", "w", "width"), "width+w2*width");
        assert_eq!(rename_identifier("max(_w, w)", "w", "x"), "max(_w, x)");
    }

    #[test]
    fn test_rename_skips_function_calls() {
        assert_eq!(
            rename_identifier("max(a, max) + max (b)", "max", "limit"),
            "max(a, limit) + max (b)"
        );

        let env = ParamEnv::from_expressions([("max", "4"), ("y", "max(1, 2) * max")]);
        let env = env.update_param_name(id(&env, "max"), "cap").unwrap();
        assert_eq!(env.get_by_name("y").unwrap().expression, "max(1, 2) * cap");
        assert_eq!(value(&env, "y"), 8.0);
        assert!(!env.has_errors());
    }

    #[test]
    fn test_nan_error_env_equals_its_copy() {
        let env = ParamEnv::from_expressions([("bad", "sqrt(-1)")]);
        assert!(matches!(
            env.error(id(&env, "bad")),
            Some(ParamEvalError::Expression(ExprError::Eval(EvalError::NonFinite(_))))
        ));
        assert_eq!(env.clone(), env);
        assert_eq!(env.evaluate(), env);
    }

    #[test]
    fn test_serialization_drops_errors() {
        let env = ParamEnv::from_expressions([("a", "1/0"), ("b", "4")]);
        let text = ron::to_string(&env).unwrap();
        assert!(!text.contains("Division"));
        let back: ParamEnv = ron::from_str(&text).unwrap();
        assert_eq!(back, env);
        assert!(back.has_errors());
    }
}
