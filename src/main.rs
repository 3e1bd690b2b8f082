use clap::Parser;
use fuel_settings_check::cli::{options, Cli, Commands, Format, NetworkFormat};
use fuel_settings_check::expression::{ExpressionCache, ModelPath};
use fuel_settings_check::output;
use fuel_settings_check::restrictions::{evaluate_settings, DependencyIndex};
use fuel_settings_check::validation::validate_networks;
use fuel_settings_check::ClusterSnapshot;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    log4rs::init_file(&cli.log_config, Default::default())
        .map_err(|e| format!("Error initializing log4rs from {}: {e}", cli.log_config))?;
    log::info!("#Start main()");

    match cli.command {
        Commands::Eval {
            expression,
            snapshot,
            non_strict,
        } => {
            let models = ClusterSnapshot::load(&snapshot)?.models()?;
            let evaluation =
                fuel_settings_check::evaluate(&expression, &models, &options(non_strict))?;
            print!("{}", output::evaluation_report(&expression, &evaluation));
        }
        Commands::Settings {
            snapshot,
            non_strict,
            format,
        } => {
            let snapshot = ClusterSnapshot::load(&snapshot)?;
            let states = evaluate_settings(&snapshot.settings, &snapshot.models()?, options(non_strict));
            match format {
                Format::Text => print!("{}", output::settings_report(&states)),
                Format::Json => println!("{}", serde_json::to_string_pretty(&states)?),
                Format::Csv => print!("{}", output::settings_csv(&states)),
            }
        }
        Commands::Networks { snapshot, format } => {
            let snapshot = ClusterSnapshot::load(&snapshot)?;
            let report = validate_networks(&snapshot.networks, &snapshot.networking_parameters);
            match format {
                NetworkFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                NetworkFormat::Text => print!("{}", output::network_report(&report)),
            }
            if !report.is_valid() {
                std::process::exit(1);
            }
        }
        Commands::Dependents { path, snapshot } => {
            let snapshot = ClusterSnapshot::load(&snapshot)?;
            let index = DependencyIndex::build(&snapshot.settings, &mut ExpressionCache::new());
            let changed = ModelPath::parse(&path);
            print!(
                "{}",
                output::dependents_report(&changed.to_string(), &index.dependents(&changed))
            );
        }
    }
    Ok(())
}
