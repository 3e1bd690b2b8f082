//! Settings restrictions and dependencies.
//!
//! - [`check_restrictions`] / [`check_dependencies`] evaluate lists of
//!   conditions and join the messages of the ones that fire
//! - [`SettingsChecker`] computes a [`SettingState`] per setting
//! - [`evaluate_settings`] does so for a whole schema, one setting at a time
//! - [`DependencyIndex`] maps model paths to the settings that read them

mod check;
mod index;

pub use check::{
    check_dependencies, check_restrictions, RestrictionCheck, SettingState, SettingsChecker,
};
pub use index::DependencyIndex;

use crate::expression::{EvaluateOptions, Models};
use crate::models::SettingsSchema;
use std::collections::BTreeMap;

/// State of every `section.setting` in `schema`.
///
/// A setting whose conditions fail is reported with `error` set and does not
/// affect the others.
pub fn evaluate_settings(
    schema: &SettingsSchema,
    models: &Models,
    options: EvaluateOptions,
) -> BTreeMap<String, SettingState> {
    let mut checker = SettingsChecker::new(options);
    let states: BTreeMap<String, SettingState> = schema
        .iter()
        .map(|(path, section, setting)| {
            let state = checker.setting_state_isolated(&path, models, section, setting);
            (path, state)
        })
        .collect();
    log::info!(
        "Evaluated {} setting(s): {} disabled, {} hidden, {} with errors",
        states.len(),
        states.values().filter(|s| s.disabled).count(),
        states.values().filter(|s| s.hidden).count(),
        states.values().filter(|s| s.error.is_some()).count()
    );
    states
}
