//! Command line definition of the `fuel-settings-check` binary.

use crate::config;
use crate::expression::EvaluateOptions;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "fuel-settings-check",
    about = "Evaluate settings restrictions and validate networks of a cluster snapshot",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// log4rs configuration file
    #[arg(long, global = true, env = "FUEL_LOG_CONFIG", default_value = config::DEFAULT_LOG_CONFIG)]
    pub log_config: String,
}

/// Output of the `settings` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Csv,
}

/// Output of the `networks` command. The report is nested, so there is no CSV.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NetworkFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one expression against the snapshot models
    Eval {
        expression: String,
        #[arg(short, long, env = "FUEL_SNAPSHOT")]
        snapshot: String,
        /// Read missing paths as null instead of failing
        #[arg(long)]
        non_strict: bool,
    },
    /// Disabled/hidden state of every setting
    Settings {
        #[arg(short, long, env = "FUEL_SNAPSHOT")]
        snapshot: String,
        #[arg(long)]
        non_strict: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Validate the network configuration, exits 1 on errors
    Networks {
        #[arg(short, long, env = "FUEL_SNAPSHOT")]
        snapshot: String,
        #[arg(long, value_enum, default_value = "text")]
        format: NetworkFormat,
    },
    /// Settings whose conditions read a model path
    Dependents {
        /// e.g. settings:common.debug.value
        path: String,
        #[arg(short, long, env = "FUEL_SNAPSHOT")]
        snapshot: String,
    },
}

/// Evaluation options for the `--non-strict` flag.
pub fn options(non_strict: bool) -> EvaluateOptions {
    if non_strict {
        EvaluateOptions::non_strict()
    } else {
        EvaluateOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_networks_format() {
        let cli = Cli::try_parse_from([
            "fuel-settings-check",
            "networks",
            "--snapshot",
            "cluster.json",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Networks { format: NetworkFormat::Json, .. }
        ));

        let csv = Cli::try_parse_from([
            "fuel-settings-check",
            "networks",
            "--snapshot",
            "cluster.json",
            "--format",
            "csv",
        ]);
        assert_eq!(
            csv.unwrap_err().kind(),
            clap::error::ErrorKind::InvalidValue,
            "network report has no CSV form"
        );
    }

    #[test]
    fn test_settings_format() {
        let cli = Cli::try_parse_from([
            "fuel-settings-check",
            "settings",
            "-s",
            "cluster.json",
            "--format",
            "csv",
            "--non-strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Settings {
                snapshot,
                non_strict,
                format,
            } => {
                assert_eq!(snapshot, "cluster.json");
                assert!(non_strict);
                assert_eq!(format, Format::Csv);
            }
            other => panic!("Expected settings command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
