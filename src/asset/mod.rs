//! Asset extraction.
//!
//! - [`extract`]: pick code, a style asset, an embedded asset or the raw
//!   pre-template source out of a build result
//! - [`style`]: the external style preprocessor interface

pub mod extract;
pub mod style;

pub use extract::{Extracted, Extractor};
pub use style::{StyleError, StyleOutput, StylePreprocessor, StyleRequest, join_errors};
