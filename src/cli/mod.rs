//! Command-line interface module.

mod args;
pub mod config;
pub mod filter;
pub mod resolve;

pub use args::{Cli, Commands};

use std::path::Path;

use anyhow::{Context, Result};
use ease_bridge::config::{BridgeConfig, find_config_file};

/// Locate and load the config file, falling back to defaults when the
/// default file name is not found anywhere up the tree.
pub fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    match find_config_file(&cli.config) {
        Some(path) => BridgeConfig::load(&path)
            .with_context(|| format!("failed to load {}", path.display())),
        None if cli.config == Path::new(ease_bridge::config::CONFIG_FILE) => {
            ease_bridge::debug!("config"; "no {} found, using defaults", cli.config.display());
            Ok(BridgeConfig::default())
        }
        None => anyhow::bail!("config file not found: {}", cli.config.display()),
    }
}
