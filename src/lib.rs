//! Incremental compilation bridge between a component language and a host
//! module bundler.
//!
//! The host registers one [`Bridge`] per build pipeline. Bridges share a
//! [`BridgeContext`] owning the compilation registry: source files are
//! analyzed once per content change, built once per pipeline and revision,
//! and on hot update only the dependent modules whose sections changed are
//! invalidated.
//!
//! | Module        | Purpose                                              |
//! |---------------|------------------------------------------------------|
//! | `resource`    | id parsing, include/exclude filter, id resolution    |
//! | `compilation` | per-file records and the registry                    |
//! | `pipeline`    | pipeline trait, plugin records, scope resolution     |
//! | `build`       | build results and the build orchestrator             |
//! | `asset`       | sub-asset extraction, style preprocessor interface   |
//! | `reload`      | section diffing and hot-update coordination          |
//! | `deps`        | reverse dependency graph, watch propagation          |
//! | `watch`       | watcher, debouncer, context directories, session     |
//! | `bridge`      | host-facing hooks                                    |
//! | `config`      | `bridge.toml`                                        |

pub mod analyzer;
pub mod asset;
pub mod bridge;
pub mod build;
pub mod compilation;
pub mod config;
pub mod deps;
pub mod diagnostic;
pub mod error;
pub mod freshness;
pub mod logger;
pub mod pipeline;
pub mod reload;
pub mod resource;
pub mod utils;
pub mod watch;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, BridgeContext, LoadOutput};
pub use error::{BridgeError, Result};
