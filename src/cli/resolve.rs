//! `ease-bridge resolve`: print parsed resource descriptors.

use anyhow::Result;
use ease_bridge::config::BridgeConfig;
use ease_bridge::resource::parse_resource;
use serde_json::{Value as JsonValue, json};

pub fn run(config: &BridgeConfig, ids: &[String], pretty: bool) -> Result<()> {
    let filter = config.filter.build()?;
    let descriptors: Vec<JsonValue> = ids
        .iter()
        .map(|id| {
            let descriptor = parse_resource(id, &config.resolve);
            json!({
                "accepted": filter.accepts(id),
                "path": descriptor.path,
                "raw_id": descriptor.raw_id,
                "query": descriptor.query,
            })
        })
        .collect();

    let formatted = if pretty {
        serde_json::to_string_pretty(&descriptors)?
    } else {
        serde_json::to_string(&descriptors)?
    };
    println!("{}", formatted);
    Ok(())
}
