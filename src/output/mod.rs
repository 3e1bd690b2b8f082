//! Output formatting for evaluation and validation results.
//!
//! - [`csv`] - CSV rows of setting states
//! - [`terminal`] - Terminal reports with colors

mod csv;
mod terminal;

pub use csv::{escape_csv_field, settings_csv};
pub use terminal::{
    dependents_report, evaluation_report, format_field, network_report, settings_report,
};
