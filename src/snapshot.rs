//! Cluster snapshot files.
//!
//! A snapshot is one JSON document holding what the console would otherwise
//! fetch from the backend: the settings tree, the cluster and release
//! attributes, the network configuration and any further named models.

use crate::expression::{JsonModel, Models, Namespace};
use crate::models::{Network, NetworkingParameters, SettingsSchema};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

#[derive(Deserialize)]
struct RawSnapshot {
    settings: serde_json::Value,
    #[serde(default)]
    cluster: serde_json::Value,
    #[serde(default)]
    version: serde_json::Value,
    #[serde(default)]
    networking_parameters: NetworkingParameters,
    #[serde(default)]
    networks: Vec<Network>,
    #[serde(default)]
    models: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    pub settings: SettingsSchema,
    /// The settings tree as loaded, fields the schema does not model included.
    pub settings_data: serde_json::Value,
    pub cluster: serde_json::Value,
    pub version: serde_json::Value,
    pub networking_parameters: NetworkingParameters,
    pub networks: Vec<Network>,
    /// Additional models by namespace name.
    pub extra_models: BTreeMap<String, serde_json::Value>,
}

impl ClusterSnapshot {
    /// Parse a snapshot. Errors name the JSON path that failed.
    pub fn from_json(json: &str) -> Result<ClusterSnapshot, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let raw: RawSnapshot = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing snapshot: path={} error={}", e.path(), e))?;
        let settings: SettingsSchema = serde_path_to_error::deserialize(raw.settings.clone())
            .map_err(|e| {
                format!(
                    "Error parsing snapshot: path=settings.{} error={}",
                    e.path(),
                    e
                )
            })?;
        Ok(ClusterSnapshot {
            settings,
            settings_data: raw.settings,
            cluster: raw.cluster,
            version: raw.version,
            networking_parameters: raw.networking_parameters,
            networks: raw.networks,
            extra_models: raw.models,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<ClusterSnapshot, Box<dyn Error>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading snapshot {}: {e}", path.display()))?;
        let snapshot = ClusterSnapshot::from_json(&json)?;
        log::info!(
            "Loaded snapshot {}: {} setting(s), {} network(s)",
            path.display(),
            snapshot.settings.iter().count(),
            snapshot.networks.len()
        );
        Ok(snapshot)
    }

    /// Models for expression evaluation.
    ///
    /// `default` shares state with `settings`, so a write through either is
    /// seen by both.
    pub fn models(&self) -> Result<Models, Box<dyn Error>> {
        let settings = JsonModel::new(self.settings_data.clone());
        let networking_parameters = serde_json::to_value(&self.networking_parameters)?;
        let mut models = Models::new()
            .with(Namespace::Settings, settings.clone())
            .with(Namespace::Default, settings)
            .with(Namespace::Cluster, JsonModel::new(self.cluster.clone()))
            .with(Namespace::Version, JsonModel::new(self.version.clone()))
            .with(
                Namespace::NetworkingParameters,
                JsonModel::new(networking_parameters),
            );
        for (name, data) in &self.extra_models {
            models = models.with(Namespace::parse(name), JsonModel::new(data.clone()));
        }
        Ok(models)
    }
}
