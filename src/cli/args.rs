//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Inspect how the bridge sees module ids and pipelines
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "bridge.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse module ids and print their descriptors as JSON
    #[command(visible_alias = "r")]
    Resolve {
        /// Module ids as the host hands them over
        #[arg(required = true)]
        ids: Vec<String>,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show which ids the include/exclude filter accepts
    #[command(visible_alias = "f")]
    Filter {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Validate the config and print the pipeline table
    #[command(visible_alias = "c")]
    Config {
        /// Also print which pipeline owns each of these files
        #[arg(short, long = "owner", value_hint = clap::ValueHint::FilePath)]
        owners: Vec<PathBuf>,
    },
}
