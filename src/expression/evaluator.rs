//! Evaluation of parsed expressions against live models.
//!
//! Evaluation is a pure read. Besides the value it reports every model path
//! actually dereferenced, so a caller can subscribe to exactly those paths
//! with [`compose_listeners`] and re-run the expression when one changes.
//! Operands skipped by `and` / `or` short-circuiting are not read and do not
//! show up in [`Evaluation::model_paths`].

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::error::{ExpressionError, Result};
use super::model::{ListenerSet, Models};
use super::model_path::ModelPath;
use super::parser;
use super::value::Value;
use itertools::Itertools;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Fail on paths the models lack instead of reading them as `null`.
    pub strict: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        EvaluateOptions { strict: true }
    }
}

impl EvaluateOptions {
    pub fn non_strict() -> EvaluateOptions {
        EvaluateOptions { strict: false }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    /// Distinct paths read, in the order they were first read.
    pub model_paths: Vec<ModelPath>,
}

impl Evaluation {
    pub fn is_true(&self) -> bool {
        self.value.is_truthy()
    }
}

/// A parsed, immutable expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse `source`. Fails with [`ExpressionError::Syntax`].
    pub fn parse(source: &str) -> Result<Expression> {
        let ast = parser::parse(source)?;
        log::trace!("parsed expression '{source}'");
        Ok(Expression {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Every distinct path the expression could read, whichever branch runs.
    pub fn referenced_paths(&self) -> Vec<ModelPath> {
        self.ast.paths().into_iter().cloned().unique().collect()
    }

    pub fn evaluate(&self, models: &Models, options: &EvaluateOptions) -> Result<Evaluation> {
        let mut evaluator = Evaluator {
            models,
            options,
            touched: Vec::new(),
        };
        let value = evaluator.eval(&self.ast)?;
        let model_paths: Vec<ModelPath> = evaluator.touched.into_iter().unique().collect();
        log::debug!(
            "evaluate '{}' = {} (read {})",
            self.source,
            value,
            model_paths.iter().join(", ")
        );
        Ok(Evaluation { value, model_paths })
    }
}

/// Parse and evaluate in one step.
pub fn evaluate(source: &str, models: &Models, options: &EvaluateOptions) -> Result<Evaluation> {
    Expression::parse(source)?.evaluate(models, options)
}

struct Evaluator<'a> {
    models: &'a Models,
    options: &'a EvaluateOptions,
    touched: Vec<ModelPath>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(path) => self.lookup(path),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => value.neg(),
                }
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?.is_truthy();
                let result = match op {
                    LogicalOp::And => left && self.eval(right)?.is_truthy(),
                    LogicalOp::Or => left || self.eval(right)?.is_truthy(),
                };
                Ok(Value::Bool(result))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                apply(*op, &left, &right)
            }
        }
    }

    fn lookup(&mut self, path: &ModelPath) -> Result<Value> {
        self.touched.push(path.clone());
        match path.get(self.models)? {
            Some(json) => Ok(Value::from(json)),
            None if self.options.strict && !path.optional => {
                Err(ExpressionError::UndefinedValue {
                    path: path.to_string(),
                })
            }
            None => Ok(Value::Null),
        }
    }
}

fn apply(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let ordered = |accept: fn(Ordering) -> bool| -> Result<Value> {
        Ok(Value::Bool(accept(left.compare(right)?)))
    };
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => ordered(Ordering::is_lt),
        BinaryOp::Le => ordered(Ordering::is_le),
        BinaryOp::Gt => ordered(Ordering::is_gt),
        BinaryOp::Ge => ordered(Ordering::is_ge),
        BinaryOp::In => Ok(Value::Bool(right.contains(left)?)),
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => left.sub(right),
        BinaryOp::Mul => left.mul(right),
        BinaryOp::Div => left.div(right),
        BinaryOp::Rem => left.rem(right),
    }
}

/// Parsed expressions memoised by source text.
///
/// Sources that fail to parse are not cached.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    entries: HashMap<String, Arc<Expression>>,
}

impl ExpressionCache {
    pub fn new() -> ExpressionCache {
        ExpressionCache::default()
    }

    pub fn get_or_parse(&mut self, source: &str) -> Result<Arc<Expression>> {
        if let Some(expression) = self.entries.get(source) {
            log::trace!("expression cache hit '{source}'");
            return Ok(Arc::clone(expression));
        }
        log::trace!("expression cache miss '{source}'");
        let expression = Arc::new(Expression::parse(source)?);
        self.entries
            .insert(source.to_string(), Arc::clone(&expression));
        Ok(expression)
    }

    pub fn evaluate(
        &mut self,
        source: &str,
        models: &Models,
        options: &EvaluateOptions,
    ) -> Result<Evaluation> {
        self.get_or_parse(source)?.evaluate(models, options)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Subscribe `callback` to every path an evaluation read.
///
/// The caller keeps the returned set for as long as it wants notifications
/// and drops it on teardown.
pub fn compose_listeners<F>(
    evaluation: &Evaluation,
    models: &Models,
    callback: F,
) -> Result<ListenerSet>
where
    F: FnMut(&ModelPath) + 'static,
{
    let callback = Rc::new(RefCell::new(callback));
    let mut listeners = ListenerSet::new();
    for path in &evaluation.model_paths {
        let callback = Rc::clone(&callback);
        let changed = path.clone();
        listeners.push(path.change(models, move |_, _| {
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (callback)(&changed);
            }
        })?);
    }
    log::debug!("composed {} listener(s)", listeners.len());
    Ok(listeners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{JsonModel, Namespace};
    use serde_json::json;
    use std::cell::Cell;

    fn models() -> Models {
        Models::new()
            .with(
                Namespace::Settings,
                JsonModel::new(json!({
                    "foo": {"value": "bar"},
                    "common": {"debug": {"value": false}, "workers": {"value": 4}},
                })),
            )
            .with(
                Namespace::Cluster,
                JsonModel::new(json!({"mode": "ha_compact", "status": "new"})),
            )
            .with(
                Namespace::Version,
                JsonModel::new(json!({"feature_groups": ["mirantis"]})),
            )
            .with(Namespace::Default, JsonModel::new(json!({"flag": true})))
    }

    fn paths(evaluation: &Evaluation) -> Vec<String> {
        evaluation.model_paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_equality_reports_path() {
        let result = evaluate(
            "settings:foo.value == 'bar'",
            &models(),
            &EvaluateOptions::default(),
        )
        .unwrap();
        assert_eq!(result.value, Value::Bool(true));
        assert_eq!(paths(&result), vec!["settings.foo.value"]);
    }

    #[test]
    fn test_or_short_circuit_skips_paths() {
        let result = evaluate(
            "settings:foo.value == 'bar' or cluster:mode == 'multinode'",
            &models(),
            &EvaluateOptions::default(),
        )
        .unwrap();
        assert!(result.is_true());
        assert_eq!(paths(&result), vec!["settings.foo.value"]);
    }

    #[test]
    fn test_and_short_circuit_skips_paths() {
        let result = evaluate(
            "settings:common.debug.value and cluster:missing.path",
            &models(),
            &EvaluateOptions::default(),
        )
        .unwrap();
        assert_eq!(result.value, Value::Bool(false));
        assert_eq!(paths(&result), vec!["settings.common.debug.value"]);
    }

    #[test]
    fn test_paths_deduplicated_in_order() {
        let result = evaluate(
            "cluster:status == 'new' and (settings:foo.value != 'x' and cluster:status != 'error')",
            &models(),
            &EvaluateOptions::default(),
        )
        .unwrap();
        assert!(result.is_true());
        assert_eq!(paths(&result), vec!["cluster.status", "settings.foo.value"]);
    }

    #[test]
    fn test_membership_and_arithmetic() {
        let m = models();
        let opts = EvaluateOptions::default();
        assert!(evaluate("'mirantis' in version:feature_groups", &m, &opts)
            .unwrap()
            .is_true());
        assert!(!evaluate("'experimental' in version:feature_groups", &m, &opts)
            .unwrap()
            .is_true());
        assert_eq!(
            evaluate("settings:common.workers.value * 2 + 1", &m, &opts)
                .unwrap()
                .value,
            Value::Number(9.0)
        );
        assert!(evaluate("settings:common.workers.value >= 4", &m, &opts)
            .unwrap()
            .is_true());
        assert!(evaluate("not flag == false", &m, &opts).unwrap().is_true());
    }

    #[test]
    fn test_lookup_errors() {
        let m = models();
        assert_eq!(
            evaluate("roles:controller", &m, &EvaluateOptions::default()),
            Err(ExpressionError::UnknownModel {
                name: "roles".to_string()
            })
        );
        assert_eq!(
            evaluate("cluster:net_provider == 'neutron'", &m, &EvaluateOptions::default()),
            Err(ExpressionError::UndefinedValue {
                path: "cluster.net_provider".to_string()
            })
        );
        let relaxed = evaluate(
            "cluster:net_provider == null",
            &m,
            &EvaluateOptions::non_strict(),
        )
        .unwrap();
        assert!(relaxed.is_true());
        let optional = evaluate(
            "cluster:net_provider? == null",
            &m,
            &EvaluateOptions::default(),
        )
        .unwrap();
        assert!(optional.is_true());
        assert_eq!(paths(&optional), vec!["cluster.net_provider"]);
    }

    #[test]
    fn test_type_errors() {
        let m = models();
        let opts = EvaluateOptions::default();
        assert!(matches!(
            evaluate("cluster:mode > 3", &m, &opts),
            Err(ExpressionError::Type { .. })
        ));
        assert_eq!(
            evaluate("1 / (2 - 2)", &m, &opts),
            Err(ExpressionError::DivisionByZero)
        );
        assert_eq!(evaluate("'4' == 4", &m, &opts).unwrap().value, Value::Bool(false));
    }

    #[test]
    fn test_models_are_not_modified() {
        let settings = JsonModel::new(json!({"a": {"value": 1}}));
        let m = Models::new().with(Namespace::Settings, settings.clone());
        let before = settings.data();
        evaluate("settings:a.value + 1 == 2", &m, &EvaluateOptions::default()).unwrap();
        assert_eq!(settings.data(), before);
    }

    #[test]
    fn test_referenced_paths_include_unreached_branches() {
        let expr = Expression::parse("a or cluster:mode == 'ha' or a").unwrap();
        let referenced: Vec<String> = expr
            .referenced_paths()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(referenced, vec!["default.a", "cluster.mode"]);
        assert_eq!(expr.source(), "a or cluster:mode == 'ha' or a");
    }

    #[test]
    fn test_cache() {
        let mut cache = ExpressionCache::new();
        let first = cache.get_or_parse("cluster:mode == 'ha'").unwrap();
        let second = cache.get_or_parse("cluster:mode == 'ha'").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_parse("cluster:mode ==").is_err());
        assert_eq!(cache.len(), 1, "failed parses are not cached");
        let result = cache
            .evaluate("cluster:mode == 'ha_compact'", &models(), &EvaluateOptions::default())
            .unwrap();
        assert!(result.is_true());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_compose_listeners_fires_and_tears_down() {
        let settings = JsonModel::new(json!({"foo": {"value": "bar"}, "other": 1}));
        let m = Models::new().with(Namespace::Settings, settings.clone());
        let result = evaluate(
            "settings:foo.value == 'bar'",
            &m,
            &EvaluateOptions::default(),
        )
        .unwrap();

        let fired = Rc::new(Cell::new(0));
        let fired_clone = Rc::clone(&fired);
        let listeners = compose_listeners(&result, &m, move |path| {
            assert_eq!(path.to_string(), "settings.foo.value");
            fired_clone.set(fired_clone.get() + 1);
        })
        .unwrap();
        assert_eq!(listeners.len(), 1);

        settings.set("foo.value", json!("baz"));
        settings.set("other", json!(2));
        assert_eq!(fired.get(), 1);

        drop(listeners);
        assert_eq!(settings.listener_count(), 0);
        settings.set("foo.value", json!("bar"));
        assert_eq!(fired.get(), 1);
    }
}
