//! CLI commands.

pub mod build;
pub mod convert;
pub mod decode_names;
pub mod serve;
pub mod validate;
