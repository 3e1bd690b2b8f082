//! CSV output of setting states.

use crate::restrictions::SettingState;
use std::collections::BTreeMap;

const HEADER: &str = r#""setting","disabled","hidden","message","error""#;

pub fn escape_csv_field(input: &str) -> String {
    if input.contains(',') || input.contains('"') {
        // excel does not like spaces after comma between fields
        let escaped = input.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        input.to_string()
    }
}

/// Setting states as CSV, header first, one row per setting.
pub fn settings_csv(states: &BTreeMap<String, SettingState>) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (path, state) in states {
        let row = [
            escape_csv_field(path),
            state.disabled.to_string(),
            state.hidden.to_string(),
            escape_csv_field(state.message.as_deref().unwrap_or_default()),
            escape_csv_field(state.error.as_deref().unwrap_or_default()),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field(r#"say "hi""#), r#""say ""hi""""#);
    }

    #[test]
    fn test_settings_csv() {
        let states = BTreeMap::from([(
            "common.debug".to_string(),
            SettingState {
                disabled: true,
                message: Some("Locked, cluster deployed.".to_string()),
                ..Default::default()
            },
        )]);
        assert_eq!(
            settings_csv(&states),
            format!("{HEADER}\ncommon.debug,true,false,\"Locked, cluster deployed.\",\n")
        );
    }
}
