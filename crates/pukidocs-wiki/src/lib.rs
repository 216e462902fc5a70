//! PukiWiki to Markdown conversion.
//!
//! This crate decodes PukiWiki data directories (hex-encoded page names,
//! legacy Japanese encodings) and rewrites wiki markup into Markdown laid
//! out for a folder-per-locale documentation site.

pub mod batch;
pub mod blocks;
pub mod encoding;
pub mod links;
pub mod pagename;
pub mod rules;

mod images;
mod page;

pub use batch::{ConvertError, ConvertOptions, ConvertReport, LocaleSource, WikiConverter};
pub use encoding::SourceEncoding;
pub use links::PageContext;
pub use page::convert_page;
pub use pagename::{decode_hex_runs, decode_page_name, NameError};
