//! Settings schema data model.
//!
//! Settings are grouped into sections. Every section carries a `metadata`
//! object; every other key of a section is a [`Setting`]. Both may carry
//! [`Restriction`]s whose conditions are expression strings.

use crate::config;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a satisfied restriction does to its setting.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionAction {
    #[default]
    Disable,
    Hide,
}

/// A condition that disables or hides a setting while it is true.
///
/// Accepted input shapes:
/// - `"cluster:mode == 'ha'"`
/// - `{"condition": "...", "action": "hide", "message": "...", "strict": false}`
/// - `{"cluster:mode == 'ha'": "message"}`
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub condition: String,
    pub action: RestrictionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Overrides the evaluator's strict lookup mode for this condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl Restriction {
    pub fn new(condition: impl Into<String>) -> Restriction {
        Restriction {
            condition: condition.into(),
            action: RestrictionAction::default(),
            message: None,
            strict: None,
        }
    }

    pub fn with_action(mut self, action: RestrictionAction) -> Restriction {
        self.action = action;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Restriction {
        self.message = Some(message.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRestriction {
    Condition(String),
    Full {
        condition: String,
        #[serde(default)]
        action: Option<RestrictionAction>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        strict: Option<bool>,
    },
    Short(BTreeMap<String, Option<String>>),
}

impl<'de> Deserialize<'de> for Restriction {
    fn deserialize<D>(deserializer: D) -> Result<Restriction, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawRestriction::deserialize(deserializer)? {
            RawRestriction::Condition(condition) => Ok(Restriction::new(condition)),
            RawRestriction::Full {
                condition,
                action,
                message,
                strict,
            } => Ok(Restriction {
                condition,
                action: action.unwrap_or_default(),
                message,
                strict,
            }),
            RawRestriction::Short(map) => {
                if map.len() != 1 {
                    return Err(de::Error::custom(format!(
                        "restriction shorthand must have exactly one key, got {}",
                        map.len()
                    )));
                }
                let (condition, message) = map.into_iter().next().ok_or_else(|| {
                    de::Error::custom("restriction shorthand must have exactly one key")
                })?;
                Ok(Restriction {
                    condition,
                    action: RestrictionAction::default(),
                    message,
                    strict: None,
                })
            }
        }
    }
}

/// A single editable setting.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Setting {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Conditions that must all hold for the setting to be usable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<Restriction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub weight: i64,
    /// Applied to every setting of the section.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
}

/// A group of settings sharing one `metadata` block.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Section {
    #[serde(default)]
    pub metadata: SectionMetadata,
    #[serde(flatten)]
    pub settings: BTreeMap<String, Setting>,
}

/// The whole editable settings tree, keyed by section name.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct SettingsSchema {
    pub sections: BTreeMap<String, Section>,
}

impl SettingsSchema {
    /// Iterate `(section.setting, section, setting)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Section, &Setting)> + '_ {
        self.sections.iter().flat_map(|(section_name, section)| {
            section.settings.iter().map(move |(name, setting)| {
                (make_path(section_name, name), section, setting)
            })
        })
    }

    /// Look up a setting by `section.setting` path.
    pub fn get(&self, path: &str) -> Option<(&Section, &Setting)> {
        let (section_name, name) = path.split_once('.')?;
        let section = self.sections.get(section_name)?;
        section.settings.get(name).map(|setting| (section, setting))
    }
}

pub fn make_path(section: &str, setting: &str) -> String {
    format!("{section}.{setting}")
}

/// Joins the non-empty messages of a set of restrictions.
pub fn join_messages<'a>(messages: impl IntoIterator<Item = Option<&'a str>>) -> String {
    messages
        .into_iter()
        .flatten()
        .filter(|m| !m.is_empty())
        .collect::<Vec<&str>>()
        .join(config::MESSAGE_SEPARATOR)
}
