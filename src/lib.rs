//! Settings restriction evaluation and network validation for a Fuel
//! cluster configuration.
//!
//! - [`expression`] - parse and evaluate restriction conditions against models
//! - [`restrictions`] - per-setting disabled/hidden state and dependency index
//! - [`validation`] - IPv4, CIDR, range, gateway and VLAN checks
//! - [`snapshot`] - load a cluster snapshot from JSON
//! - [`cli`] - command line of the binary

pub mod cli;
pub mod config;
pub mod expression;
pub mod models;
pub mod output;
pub mod restrictions;
pub mod snapshot;
pub mod validation;

pub use expression::{evaluate, EvaluateOptions, Evaluation, Expression, ExpressionError, Models};
pub use restrictions::{evaluate_settings, DependencyIndex, SettingState};
pub use snapshot::ClusterSnapshot;
