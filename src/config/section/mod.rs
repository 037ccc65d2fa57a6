//! Configuration section definitions.
//!
//! | Section        | Purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `[filter]`     | Which ids belong to the bridge                  |
//! | `[resolve]`    | Id parsing (prefixes, variant suffix, extensions) |
//! | `[hot]`        | Hot-update coordinator and watch session        |
//! | `[style]`      | Style preprocessing                             |
//! | `[[pipeline]]` | Registered build pipelines                      |

mod filter;
mod hot;
mod pipeline;
mod resolve;
mod style;

pub use filter::FilterConfig;
pub use hot::HotConfig;
pub use pipeline::{
    BuildMode, Capability, ExtFormation, ImportFormation, PipelineConfig, PipelineOptions, Target,
};
pub use resolve::ResolveConfig;
pub use style::StyleConfig;
