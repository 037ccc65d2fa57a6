//! Host bundler integration.
//!
//! - [`context`]: `BridgeContext`, the per-session owner of every other part
//! - [`hooks`]: `Bridge`, the plugin hooks of one pipeline
//!
//! ```text
//! BridgeContext::builder(config, analyzer)
//!     .pipeline("client", client)
//!     .pipeline("server", server)
//!     .build()?          // validate config, bind pipelines
//!     .main_bridge()     // resolve_id / load / transform / handle_hot_update / routes
//! ```

pub mod context;
pub mod hooks;

pub use context::{BridgeBuilder, BridgeContext};
pub use hooks::{Bridge, LoadOutput};
