//! Reverse dependency index over a settings schema.
//!
//! Built once when settings metadata is loaded: every restriction and
//! `depends` condition is parsed and each model path it mentions is mapped to
//! the settings that mention it. A change to a path then re-evaluates only
//! those settings instead of rescanning the whole schema.

use super::check::{SettingState, SettingsChecker};
use crate::expression::{ExpressionCache, ModelPath, Models, Namespace};
use crate::models::SettingsSchema;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct DependencyIndex {
    dependents: HashMap<ModelPath, BTreeSet<String>>,
}

impl DependencyIndex {
    /// Index every condition in `schema`. Conditions that fail to parse are
    /// logged and left out.
    pub fn build(schema: &SettingsSchema, cache: &mut ExpressionCache) -> DependencyIndex {
        let mut index = DependencyIndex::default();
        for (path, section, setting) in schema.iter() {
            let conditions = section
                .metadata
                .restrictions
                .iter()
                .chain(&setting.restrictions)
                .chain(&setting.depends);
            for restriction in conditions {
                match cache.get_or_parse(&restriction.condition) {
                    Ok(expression) => {
                        for model_path in expression.referenced_paths() {
                            index
                                .dependents
                                .entry(normalize(model_path))
                                .or_default()
                                .insert(path.clone());
                        }
                    }
                    Err(e) => log::warn!(
                        "Not indexing condition '{}' of '{path}': {e}",
                        restriction.condition
                    ),
                }
            }
        }
        log::debug!(
            "dependency index: {} path(s) watched by {} setting(s)",
            index.dependents.len(),
            index.dependents.values().flatten().collect::<BTreeSet<_>>().len()
        );
        index
    }

    /// Number of distinct watched paths.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Settings whose conditions read `changed`, or a path above or below it.
    pub fn dependents(&self, changed: &ModelPath) -> BTreeSet<String> {
        let changed = normalize(changed.clone());
        self.dependents
            .iter()
            .filter(|(watched, _)| {
                watched.namespace == changed.namespace
                    && watched
                        .path
                        .iter()
                        .zip(changed.path.iter())
                        .all(|(a, b)| a == b)
            })
            .flat_map(|(_, settings)| settings.iter().cloned())
            .collect()
    }

    /// Re-evaluate the settings affected by a change to `changed`.
    pub fn recompute(
        &self,
        changed: &ModelPath,
        schema: &SettingsSchema,
        models: &Models,
        checker: &mut SettingsChecker,
    ) -> BTreeMap<String, SettingState> {
        let mut states = BTreeMap::new();
        for path in self.dependents(changed) {
            let Some((section, setting)) = schema.get(&path) else {
                log::warn!("Indexed setting '{path}' is no longer in the schema");
                continue;
            };
            let state = checker.setting_state_isolated(&path, models, section, setting);
            states.insert(path, state);
        }
        log::debug!("change of {changed} re-evaluated {} setting(s)", states.len());
        states
    }
}

/// Settings conditions read the settings model through the `default`
/// namespace too, so both spellings index under `settings`.
fn normalize(mut path: ModelPath) -> ModelPath {
    if path.namespace == Namespace::Default {
        path.namespace = Namespace::Settings;
    }
    path.optional = false;
    path
}
