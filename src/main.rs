//! ease-bridge - inspect module ids, filters and pipeline ownership.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    ease_bridge::logger::set_verbose(cli.verbose);

    let config = cli::load_config(&cli)?;

    match &cli.command {
        Commands::Resolve { ids, pretty } => cli::resolve::run(&config, ids, *pretty),
        Commands::Filter { ids } => cli::filter::run(&config, ids),
        Commands::Config { owners } => cli::config::run(&config, owners),
    }
}
