//! Restriction and dependency expressions.
//!
//! Settings metadata carries small condition strings such as
//! `settings:storage.volumes_ceph.value == true and cluster:mode != 'multinode'`.
//! This module parses them and evaluates them against a set of named models:
//! - [`lexer`] and [`parser`] - regex tokenizer and recursive descent parser
//! - [`Expression`] and [`ExpressionCache`] - parsed form, memoised by source
//! - [`evaluate`] - evaluation returning the value and the paths it read
//! - [`Models`], [`Model`] and [`JsonModel`] - the object graphs being read
//! - [`compose_listeners`] - subscriptions to re-run an expression on change
//!
//! # Grammar
//!
//! Literals are numbers, `'single'` or `"double"` quoted strings, `true`,
//! `false` and `null`. Model paths are `namespace:dotted.path`; without a
//! namespace the `default` model is used and a trailing `?` makes the path
//! optional. Operators, loosest first: `or` (`||`), `and` (`&&`), `not`
//! (`!`), `== != < <= > >= in`, `+ -`, `* / %`, unary `-`.

mod ast;
mod error;
mod evaluator;
pub mod lexer;
mod model;
mod model_path;
pub mod parser;
mod value;

pub use ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
pub use error::{ExpressionError, Result};
pub use evaluator::{
    compose_listeners, evaluate, EvaluateOptions, Evaluation, Expression, ExpressionCache,
};
pub use model::{Callback, JsonModel, ListenerSet, Model, Models, Subscription};
pub use model_path::{ModelPath, Namespace};
pub use value::Value;
