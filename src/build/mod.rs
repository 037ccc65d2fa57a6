//! Build results and the orchestrator producing them.
//!
//! - [`result`]: `BuildResult`, `Asset`, depend-file groups
//! - [`orchestrator`]: cache check, pipeline invocation, diagnostic partition

pub mod orchestrator;
pub mod result;

pub use orchestrator::{Built, Orchestrator};
pub use result::{Asset, AssetKind, BuildResult, DependGroup};
