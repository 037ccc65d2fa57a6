//! Resource ids: parsing, filtering and resolution.
//!
//! - [`descriptor`]: id → path + query (`parse_resource`)
//! - [`filter`]: include/exclude predicate run before every hook
//! - [`resolve`]: raw import request → loadable id

pub mod descriptor;
pub mod filter;
pub mod resolve;

pub use descriptor::{Query, QueryValue, RequestType, ResourceDescriptor, parse_resource};
pub use filter::Filter;
pub use resolve::{ResolveRules, formation_key, resolve_id};
