//! Static site generator for pukidocs documentation.
//!
//! Renders a localized Markdown docs tree into a directory-style HTML site.

pub mod assets;
pub mod builder;
pub mod markdown;
pub mod navigation;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use markdown::{MarkdownOptions, RenderedPage};
