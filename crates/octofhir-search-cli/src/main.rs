mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use octofhir_search_params::{QueryCompiler, SearchConfig};

use cli::{Cli, Commands};
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);
    let format = cli.format.unwrap_or_default();

    let config = match &cli.config {
        Some(path) => SearchConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    tracing::debug!(
        unknown_parameters = ?config.unknown_parameters,
        local_offset = %config.local_offset,
        dictionary = ?config.dictionary,
        "Using search config"
    );

    match &cli.command {
        Commands::Explain(args) => {
            let compiler = QueryCompiler::from_config(&config)?;
            commands::explain::explain(&compiler, args, format)?;
        }
        Commands::Parse(args) => {
            commands::parse::parse(args, config.local_offset()?, format)?;
        }
        Commands::Resources(args) => {
            let dictionary = config.dictionary()?;
            commands::resources::resources(&dictionary, args, format)?;
        }
    }
    Ok(())
}
