//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{InstantiateCommand, ShowCommand, TargetsCommand, TrainCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Compose configs, instantiate objects and train pipelines
#[derive(Debug, Parser, Clone)]
#[command(name = "confpipe")]
#[command(version = "0.1.0")]
#[command(about = "Hierarchical YAML configs, declarative instantiation and ML pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the primary config and its config groups
    #[arg(short = 'c', long, global = true, default_value = "conf")]
    pub config_dir: PathBuf,

    /// Primary config file name, without the .yaml extension
    #[arg(short = 'n', long, global = true, default_value = "config")]
    pub config_name: String,

    /// Expand comma-separated override values into one job per combination
    #[arg(short, long, global = true)]
    pub multirun: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the composed configuration
    Show(ShowCommand),

    /// Instantiate the composed configuration and print the result
    Instantiate(InstantiateCommand),

    /// Build a pipeline from the configuration and fit it on a CSV file
    Train(TrainCommand),

    /// List the registered targets
    Targets(TargetsCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
