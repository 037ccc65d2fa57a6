//! Dependency tracking.
//!
//! - [`graph`]: forward/reverse import edges, fed by the registry
//! - [`propagate`]: transitive walk for watches and server aggregate stubs

pub mod graph;
pub mod propagate;

pub use graph::DependencyGraph;
pub use propagate::Propagator;
