//! Terminal output utilities.
//!
//! Reports are built as strings so the binary only prints them.

use crate::expression::Evaluation;
use crate::restrictions::SettingState;
use crate::validation::{FieldErrors, IpRangeError, NetworkReport};
use colored::Colorize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Quote `value` and right-align it in `width` columns.
///
/// Values longer than `width` are kept whole, so a column never cuts a
/// setting path.
pub fn format_field<T: Display>(value: T, width: usize) -> String {
    let quoted = format!("\"{value}\"");
    format!("{quoted:>width$}")
}

/// Join report lines, each ending in a newline.
fn lines_to_string(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

pub fn evaluation_report(source: &str, evaluation: &Evaluation) -> String {
    let mut lines = vec![
        format!("{} {}", "expression:".bold(), source),
        format!("{} {}", "value:".bold(), evaluation.value),
        "model paths:".bold().to_string(),
    ];
    lines.extend(evaluation.model_paths.iter().map(|path| format!("  {path}")));
    lines_to_string(lines)
}

fn setting_line(path: &str, state: &SettingState, width: usize) -> String {
    let status = if state.error.is_some() {
        "ERROR".red()
    } else if state.hidden {
        "hidden".yellow()
    } else if state.disabled {
        "disabled".yellow()
    } else {
        "enabled".green()
    };
    let mut line = format!("{} {:>8}", format_field(path, width), status);
    if let Some(message) = &state.message {
        line += &format!("  {message}");
    }
    if let Some(error) = &state.error {
        line += &format!("  {}", error.red());
    }
    line
}

/// One line per setting, paths quoted and right-aligned to the longest one.
pub fn settings_report(states: &BTreeMap<String, SettingState>) -> String {
    // two extra columns for the quotes
    let width = states.keys().map(|k| k.len() + 2).max().unwrap_or(0);
    lines_to_string(
        states
            .iter()
            .map(|(path, state)| setting_line(path, state, width))
            .collect(),
    )
}

fn range_line(list: &str, error: &IpRangeError) -> String {
    let parts: Vec<String> = [("start", &error.start), ("end", &error.end)]
        .into_iter()
        .filter_map(|(side, found)| found.as_ref().map(|e| format!("{side}: {e}")))
        .collect();
    format!("  {list}[{}] {}", error.index, parts.join(", ").red())
}

fn field_lines(fields: &FieldErrors) -> impl Iterator<Item = String> + '_ {
    fields
        .iter()
        .map(|(field, error)| format!("  {field}: {}", error.to_string().red()))
}

pub fn network_report(report: &NetworkReport) -> String {
    let mut lines = Vec::new();
    for (key, errors) in &report.networks {
        lines.push(format!("{} {}", "network".bold(), key));
        lines.extend(field_lines(&errors.fields));
        lines.extend(errors.ip_ranges.iter().map(|e| range_line("ip_ranges", e)));
    }
    let parameters = &report.networking_parameters;
    if !parameters.is_empty() {
        lines.push("networking parameters".bold().to_string());
        lines.extend(field_lines(&parameters.fields));
        lines.extend(
            parameters
                .floating_ranges
                .iter()
                .map(|e| range_line("floating_ranges", e)),
        );
    }
    lines.extend(report.intersections.iter().map(|hit| {
        format!(
            "{} {} ({}) and {} ({})",
            "intersection".bold(),
            hit.first,
            hit.first_cidr,
            hit.second,
            hit.second_cidr
        )
    }));
    lines.push(if report.is_valid() {
        "Network configuration is valid".green().to_string()
    } else {
        format!("#{}# {} error(s) found", "NOTE".on_red(), report.error_count())
    });
    lines_to_string(lines)
}

pub fn dependents_report(path: &str, dependents: &BTreeSet<String>) -> String {
    if dependents.is_empty() {
        return format!("No settings depend on {path}\n");
    }
    let mut lines = vec![format!("{} setting(s) depend on {path}:", dependents.len())];
    lines.extend(dependents.iter().map(|setting| format!("  {setting}")));
    lines_to_string(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ModelPath, Value};
    use crate::validation::{NetworkErrors, ValidationError};

    #[test]
    fn test_format_field_pads_setting_path() {
        assert_eq!(format_field("common.debug", 16), "  \"common.debug\"");
        assert_eq!(format_field("common.debug", 14), "\"common.debug\"");
        assert_eq!(
            format_field("neutron_advanced.neutron_l3_ha", 10),
            "\"neutron_advanced.neutron_l3_ha\"",
            "longer values are not cut"
        );
        assert_eq!(format_field(4094, 8), "  \"4094\"");
    }

    #[test]
    fn test_evaluation_report() {
        colored::control::set_override(false);
        let evaluation = Evaluation {
            value: Value::Bool(true),
            model_paths: vec![ModelPath::parse("settings:foo.value")],
        };
        let report = evaluation_report("settings:foo.value == 'bar'", &evaluation);
        assert!(report.contains("value: true"));
        assert!(report.contains("  settings.foo.value\n"));
    }

    #[test]
    fn test_settings_report() {
        colored::control::set_override(false);
        let states = BTreeMap::from([
            ("common.debug".to_string(), SettingState::default()),
            (
                "storage.ceph".to_string(),
                SettingState {
                    disabled: true,
                    message: Some("Requires Ceph.".to_string()),
                    ..Default::default()
                },
            ),
        ]);
        let report = settings_report(&states);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("enabled"), "got {:?}", lines[0]);
        assert!(lines[1].ends_with("disabled  Requires Ceph."), "got {:?}", lines[1]);
    }

    #[test]
    fn test_settings_report_aligns_paths() {
        colored::control::set_override(false);
        let states = BTreeMap::from([
            ("a.b".to_string(), SettingState::default()),
            ("neutron_advanced.neutron_l3_ha".to_string(), SettingState {
                hidden: true,
                ..Default::default()
            }),
            ("storage.ceph".to_string(), SettingState {
                error: Some("division by zero".to_string()),
                ..Default::default()
            }),
        ]);
        let report = settings_report(&states);
        let lines: Vec<&str> = report.lines().collect();
        // longest path plus its quotes
        let width = "neutron_advanced.neutron_l3_ha".len() + 2;
        assert_eq!(lines[0], format!("{:>width$}  enabled", "\"a.b\""));
        assert_eq!(lines[1], format!("\"neutron_advanced.neutron_l3_ha\" {:>8}", "hidden"));
        assert_eq!(
            lines[2],
            format!("{:>width$}    ERROR  division by zero", "\"storage.ceph\"")
        );
    }

    #[test]
    fn test_network_report() {
        colored::control::set_override(false);
        let mut report = NetworkReport::default();
        assert!(network_report(&report).contains("valid"));

        let mut errors = NetworkErrors::default();
        errors
            .fields
            .insert("cidr".to_string(), ValidationError::SmallNetwork);
        report.networks.insert("storage#3".to_string(), errors);
        let text = network_report(&report);
        assert!(text.starts_with("network storage#3\n"), "got {text:?}");
        assert!(text.contains("cidr: Network is too small"));
        assert!(text.contains("1 error(s) found"));
    }

    #[test]
    fn test_dependents_report() {
        let dependents = BTreeSet::from(["common.verbose".to_string()]);
        assert_eq!(
            dependents_report("settings.common.debug", &dependents),
            "1 setting(s) depend on settings.common.debug:\n  common.verbose\n"
        );
        assert_eq!(
            dependents_report("x", &BTreeSet::new()),
            "No settings depend on x\n"
        );
    }
}
