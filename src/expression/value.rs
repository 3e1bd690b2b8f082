//! Runtime values and the operator semantics applied to them.
//!
//! There is no implicit coercion: `==` compares variant and payload, ordering
//! needs two numbers or two strings, arithmetic needs numbers (`+` also joins
//! two strings). Anything else is a [`ExpressionError::Type`].

use super::error::{ExpressionError, Result};
use serde_json::Map;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Object(Map<String, serde_json::Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Truthiness used by `and`, `or` and `not`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Object(_) => true,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(map.clone()),
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).ok_or_else(|| {
                ExpressionError::type_error("cannot order NaN")
            }),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            _ => Err(ExpressionError::type_error(format!(
                "cannot order {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => Err(mismatch("+", self, other)),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value> {
        let (a, b) = numbers("-", self, other)?;
        Ok(Value::Number(a - b))
    }

    pub fn mul(&self, other: &Value) -> Result<Value> {
        let (a, b) = numbers("*", self, other)?;
        Ok(Value::Number(a * b))
    }

    pub fn div(&self, other: &Value) -> Result<Value> {
        let (a, b) = numbers("/", self, other)?;
        if b == 0.0 {
            return Err(ExpressionError::DivisionByZero);
        }
        Ok(Value::Number(a / b))
    }

    pub fn rem(&self, other: &Value) -> Result<Value> {
        let (a, b) = numbers("%", self, other)?;
        if b == 0.0 {
            return Err(ExpressionError::DivisionByZero);
        }
        Ok(Value::Number(a % b))
    }

    pub fn neg(&self) -> Result<Value> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(ExpressionError::type_error(format!(
                "cannot negate {}",
                self.type_name()
            ))),
        }
    }

    /// Membership for `needle in self`.
    pub fn contains(&self, needle: &Value) -> Result<bool> {
        match (self, needle) {
            (Value::List(items), _) => Ok(items.contains(needle)),
            (Value::Str(haystack), Value::Str(s)) => Ok(haystack.contains(s.as_str())),
            (Value::Object(map), Value::Str(key)) => Ok(map.contains_key(key)),
            _ => Err(ExpressionError::type_error(format!(
                "cannot look for {} in {}",
                needle.type_name(),
                self.type_name()
            ))),
        }
    }
}

fn numbers(op: &str, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn mismatch(op: &str, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::type_error(format!(
        "unsupported operands for '{op}': {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(map),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
