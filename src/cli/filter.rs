//! `ease-bridge filter`: check ids against the include/exclude patterns.

use anyhow::Result;
use ease_bridge::config::BridgeConfig;
use owo_colors::OwoColorize;

pub fn run(config: &BridgeConfig, ids: &[String]) -> Result<()> {
    let filter = config.filter.build()?;
    for id in ids {
        if filter.accepts(id) {
            println!("{} {}", "accept".green(), id);
        } else {
            println!("{} {}", "reject".dimmed(), id);
        }
    }
    Ok(())
}
