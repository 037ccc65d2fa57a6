//! Compilation records and the registry owning them.
//!
//! - [`record`]: one file's analyzed state, build slot and watch state
//! - [`registry`]: path → record mapping, `ready`, `invalidate`, teardown

pub mod record;
pub mod registry;

pub use record::{
    Compilation, CompilationView, Invalidation, Observation, Observer, WatchState,
};
pub use registry::{Readiness, Registry};
