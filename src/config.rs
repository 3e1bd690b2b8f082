//! Product policy constants shared by the evaluator and the validators.

/// Smallest accepted CIDR prefix. `/0` and `/1` are rejected as too large.
pub const MIN_CIDR_PREFIX: u8 = 2;

/// Largest accepted CIDR prefix. `/31` and `/32` leave no room for hosts.
pub const MAX_CIDR_PREFIX: u8 = 30;

pub const MIN_VLAN: u32 = 1;
pub const MAX_VLAN: u32 = 4094;

/// Namespace used for model paths written without a `namespace:` prefix.
pub const DEFAULT_NAMESPACE: &str = "default";

/// log4rs config file read by the binary when no other is given.
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

/// Separator used when several restriction messages are reported together.
pub const MESSAGE_SEPARATOR: &str = " ";

/// Deepest expression tree the parser builds. Deeper input is a syntax error.
pub const MAX_EXPRESSION_DEPTH: usize = 128;
