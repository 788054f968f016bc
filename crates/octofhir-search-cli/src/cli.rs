use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "octofhir-search")]
#[command(about = "Inspect how FHIR search queries parse and compile")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Search config file (TOML)
    #[arg(short, long, global = true, env = "OCTOFHIR_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a query string and show each parameter's outcome
    Explain(ExplainArgs),
    /// Parse a single search value
    Parse(ParseArgs),
    /// List dictionary entries
    Resources(ResourcesArgs),
}

#[derive(clap::Args)]
pub struct ExplainArgs {
    /// Resource type (e.g. Condition)
    pub resource_type: String,
    /// Query string (e.g. "code=http://snomed.info/sct|123641001&patient=Patient/1")
    pub query: String,
    /// Fail when any parameter fails (all-or-nothing)
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Search parameter type (date, number, quantity, reference, string, token, uri)
    pub param_type: String,
    /// Raw value, including any prefix (e.g. ge2013-01-14)
    pub value: String,
}

#[derive(clap::Args)]
pub struct ResourcesArgs {
    /// Only list parameters of this resource type
    pub resource_type: Option<String>,
}
