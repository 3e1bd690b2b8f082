//! Restriction and dependency checks for a single setting.

use crate::expression::{EvaluateOptions, ExpressionCache, ModelPath, Models, Result};
use crate::models::{join_messages, Restriction, RestrictionAction, Section, Setting};
use itertools::Itertools;
use serde::Serialize;

/// Outcome of checking a list of restrictions.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct RestrictionCheck {
    /// `true` if at least one restriction matched.
    pub result: bool,
    /// Non-empty messages of the matched restrictions, space separated.
    pub message: String,
    /// Paths read while checking, for re-evaluation on change.
    #[serde(skip)]
    pub model_paths: Vec<ModelPath>,
}

/// Computed visibility of a setting.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingState {
    pub disabled: bool,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when a condition of this setting could not be evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluates restrictions with a shared expression cache.
#[derive(Debug, Default)]
pub struct SettingsChecker {
    cache: ExpressionCache,
    options: EvaluateOptions,
}

impl SettingsChecker {
    pub fn new(options: EvaluateOptions) -> SettingsChecker {
        SettingsChecker {
            cache: ExpressionCache::new(),
            options,
        }
    }

    pub fn cache(&mut self) -> &mut ExpressionCache {
        &mut self.cache
    }

    /// Check `restrictions`, optionally only those with the given action.
    pub fn check_restrictions(
        &mut self,
        models: &Models,
        action: Option<RestrictionAction>,
        restrictions: &[Restriction],
    ) -> Result<RestrictionCheck> {
        check_restrictions(models, action, restrictions, &mut self.cache, &self.options)
    }

    pub fn check_dependencies(
        &mut self,
        models: &Models,
        depends: &[Restriction],
    ) -> Result<RestrictionCheck> {
        check_dependencies(models, depends, &mut self.cache, &self.options)
    }

    /// State of one setting from its section's and its own conditions.
    pub fn setting_state(
        &mut self,
        models: &Models,
        section: &Section,
        setting: &Setting,
    ) -> Result<SettingState> {
        let section_disable = self.check_restrictions(
            models,
            Some(RestrictionAction::Disable),
            &section.metadata.restrictions,
        )?;
        let section_hide = self.check_restrictions(
            models,
            Some(RestrictionAction::Hide),
            &section.metadata.restrictions,
        )?;
        let disable =
            self.check_restrictions(models, Some(RestrictionAction::Disable), &setting.restrictions)?;
        let hide =
            self.check_restrictions(models, Some(RestrictionAction::Hide), &setting.restrictions)?;
        let depends = self.check_dependencies(models, &setting.depends)?;

        let checks = [&section_disable, &section_hide, &disable, &hide, &depends];
        let message = join_messages(
            checks
                .iter()
                .filter(|c| c.result)
                .map(|c| Some(c.message.as_str())),
        );
        Ok(SettingState {
            disabled: section_disable.result || disable.result || depends.result,
            hidden: section_hide.result || hide.result,
            message: if message.is_empty() { None } else { Some(message) },
            error: None,
        })
    }

    /// Like [`SettingsChecker::setting_state`] but never fails: a condition
    /// that cannot be evaluated is logged and leaves the setting usable.
    pub fn setting_state_isolated(
        &mut self,
        path: &str,
        models: &Models,
        section: &Section,
        setting: &Setting,
    ) -> SettingState {
        match self.setting_state(models, section, setting) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Skipping restrictions of setting '{path}': {e}");
                SettingState {
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        }
    }
}

fn options_for(restriction: &Restriction, options: &EvaluateOptions) -> EvaluateOptions {
    EvaluateOptions {
        strict: restriction.strict.unwrap_or(options.strict),
    }
}

/// Check `restrictions`, optionally only those with the given action.
///
/// Every restriction is evaluated; matches accumulate. A restriction's own
/// `strict` flag overrides `options`.
pub fn check_restrictions(
    models: &Models,
    action: Option<RestrictionAction>,
    restrictions: &[Restriction],
    cache: &mut ExpressionCache,
    options: &EvaluateOptions,
) -> Result<RestrictionCheck> {
    let mut matched: Vec<&Restriction> = Vec::new();
    let mut model_paths = Vec::new();
    for restriction in restrictions
        .iter()
        .filter(|r| action.map_or(true, |a| r.action == a))
    {
        let evaluation = cache.evaluate(
            &restriction.condition,
            models,
            &options_for(restriction, options),
        )?;
        model_paths.extend(evaluation.model_paths.iter().cloned());
        if evaluation.is_true() {
            matched.push(restriction);
        }
    }
    Ok(RestrictionCheck {
        result: !matched.is_empty(),
        message: join_messages(matched.iter().map(|r| r.message.as_deref())),
        model_paths: model_paths.into_iter().unique().collect(),
    })
}

/// Check `depends` conditions. `result` is `true` when any is unmet.
pub fn check_dependencies(
    models: &Models,
    depends: &[Restriction],
    cache: &mut ExpressionCache,
    options: &EvaluateOptions,
) -> Result<RestrictionCheck> {
    let mut unmet: Vec<&Restriction> = Vec::new();
    let mut model_paths = Vec::new();
    for dependency in depends {
        let evaluation = cache.evaluate(
            &dependency.condition,
            models,
            &options_for(dependency, options),
        )?;
        model_paths.extend(evaluation.model_paths.iter().cloned());
        if !evaluation.is_true() {
            unmet.push(dependency);
        }
    }
    Ok(RestrictionCheck {
        result: !unmet.is_empty(),
        message: join_messages(unmet.iter().map(|r| r.message.as_deref())),
        model_paths: model_paths.into_iter().unique().collect(),
    })
}
