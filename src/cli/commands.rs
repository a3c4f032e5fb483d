//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Print the composed configuration
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Overrides such as `db=postgresql`, `db.user=me`, `+extra=1` or `~key`
    pub overrides: Vec<String>,

    /// Only print the node at this dotted path
    #[arg(short, long)]
    pub select: Option<String>,

    /// Resolve `${...}` interpolations before printing
    #[arg(short, long)]
    pub resolve: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Instantiate the composed configuration
#[derive(Debug, Args, Clone)]
pub struct InstantiateCommand {
    /// Config overrides
    pub overrides: Vec<String>,

    /// Only instantiate the node at this dotted path
    #[arg(short, long)]
    pub select: Option<String>,
}

/// Fit a configured pipeline on a CSV file
#[derive(Debug, Args, Clone)]
pub struct TrainCommand {
    /// CSV file with a header row
    #[arg(short, long)]
    pub data: PathBuf,

    /// Column holding the class labels
    #[arg(short, long)]
    pub target: String,

    /// Dotted path of the pipeline node in the composed config
    #[arg(long, default_value = "pipeline")]
    pub node: String,

    /// Config overrides; with --multirun, comma-separated values are swept
    pub overrides: Vec<String>,
}

/// List the registered targets
#[derive(Debug, Args, Clone)]
pub struct TargetsCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
