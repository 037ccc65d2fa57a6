//! Hot update.
//!
//! ```text
//! change ─► Registry::invalidate ─► ready ─► SectionSnapshot ─► SectionChange
//!                                                                  │
//!                              host module graph ◄── ModuleTag ◄───┘
//! ```
//!
//! # Modules
//!
//! - `sections` - script / markup / style slices of one parse
//! - `classify` - section diff and per-module invalidation rules
//! - `coordinator` - the hot-update entry point

pub mod classify;
pub mod coordinator;
pub mod sections;

pub use classify::{ModuleTag, SectionChange};
pub use coordinator::{Coordinator, HotUpdate, ModuleGraph, ModuleNode};
pub use sections::SectionSnapshot;
