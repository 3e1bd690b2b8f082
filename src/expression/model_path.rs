//! References from an expression into the models it is evaluated against.

use super::error::{ExpressionError, Result};
use super::model::{Models, Subscription};
use crate::config;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The object graph a [`ModelPath`] points into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Settings,
    Cluster,
    Version,
    Default,
    NetworkingParameters,
    Other(String),
}

impl Namespace {
    pub fn parse(name: &str) -> Namespace {
        match name {
            "settings" => Namespace::Settings,
            "cluster" => Namespace::Cluster,
            "version" => Namespace::Version,
            config::DEFAULT_NAMESPACE => Namespace::Default,
            "networking_parameters" => Namespace::NetworkingParameters,
            other => Namespace::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Namespace::Settings => "settings",
            Namespace::Cluster => "cluster",
            Namespace::Version => "version",
            Namespace::Default => config::DEFAULT_NAMESPACE,
            Namespace::NetworkingParameters => "networking_parameters",
            Namespace::Other(name) => name,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `namespace:dotted.path` reference, e.g. `settings:common.debug.value`.
///
/// A trailing `?` marks the path optional: a missing value reads as `null`
/// instead of failing a strict evaluation. Optionality is not part of the
/// path's identity.
#[derive(Debug, Clone)]
pub struct ModelPath {
    pub namespace: Namespace,
    pub path: Vec<String>,
    pub optional: bool,
}

impl ModelPath {
    /// Parse the textual form. Paths without a namespace use `default`.
    pub fn parse(text: &str) -> ModelPath {
        let (text, optional) = match text.strip_suffix('?') {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };
        let (namespace, attribute) = match text.split_once(':') {
            Some((namespace, attribute)) => (Namespace::parse(namespace), attribute),
            None => (Namespace::Default, text),
        };
        ModelPath {
            namespace,
            path: attribute
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            optional,
        }
    }

    /// The dotted attribute path without the namespace.
    pub fn attribute(&self) -> String {
        self.path.join(".")
    }

    /// Read the current value. `Ok(None)` when the model lacks the path.
    pub fn get(&self, models: &Models) -> Result<Option<serde_json::Value>> {
        let model = models
            .get(&self.namespace)
            .ok_or_else(|| ExpressionError::UnknownModel {
                name: self.namespace.to_string(),
            })?;
        Ok(model.get(&self.path))
    }

    /// Subscribe to future changes of this path.
    ///
    /// The returned guard unsubscribes when dropped.
    pub fn change<F>(&self, models: &Models, callback: F) -> Result<Subscription>
    where
        F: FnMut(&[String], &serde_json::Value) + 'static,
    {
        let model = models
            .get(&self.namespace)
            .ok_or_else(|| ExpressionError::UnknownModel {
                name: self.namespace.to_string(),
            })?;
        Ok(model.subscribe(&self.path, Box::new(callback)))
    }
}

impl PartialEq for ModelPath {
    fn eq(&self, other: &ModelPath) -> bool {
        self.namespace == other.namespace && self.path == other.path
    }
}

impl Eq for ModelPath {}

impl Hash for ModelPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.attribute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_namespace() {
        let path = ModelPath::parse("settings:common.debug.value");
        assert_eq!(path.namespace, Namespace::Settings);
        assert_eq!(path.path, vec!["common", "debug", "value"]);
        assert!(!path.optional);
        assert_eq!(path.to_string(), "settings.common.debug.value");
        assert_eq!(path.attribute(), "common.debug.value");
    }

    #[test]
    fn test_parse_default_and_optional() {
        let path = ModelPath::parse("mode?");
        assert_eq!(path.namespace, Namespace::Default);
        assert!(path.optional);
        assert_eq!(path.to_string(), "default.mode");
        assert_eq!(path, ModelPath::parse("default:mode"));
    }

    #[test]
    fn test_namespace_round_trip_names() {
        for name in ["settings", "cluster", "version", "default", "networking_parameters", "roles"] {
            assert_eq!(Namespace::parse(name).as_str(), name);
        }
        assert_eq!(
            Namespace::parse("roles"),
            Namespace::Other("roles".to_string())
        );
    }
}
