//! Page and attachment name decoding.
//!
//! PukiWiki stores every page as `<HEX>.txt`, where `<HEX>` is the
//! upper-case hex encoding of the page name bytes.

use std::sync::LazyLock;

use regex::Regex;

use crate::encoding::decode_name_bytes;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\:*?"<>|]+"#).expect("Invalid unsafe chars regex"));

static HEX_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-F]{4,}").expect("Invalid hex run regex"));

/// Errors that can occur when decoding a name.
#[derive(Debug, thiserror::Error)]
pub enum NameError {
    #[error("Not a hex-encoded name: {0}")]
    InvalidHex(String),

    #[error("Name is neither EUC-JP nor UTF-8: {0}")]
    UnknownEncoding(String),

    #[error("Name decodes to an empty path: {0}")]
    Empty(String),
}

/// Decode a hex-encoded page name into a relative page path.
///
/// Characters that are unsafe in file names are replaced by `_`; `/` is
/// kept so that sub pages become directories.
pub fn decode_page_name(hex_name: &str) -> Result<String, NameError> {
    let bytes = hex::decode(hex_name).map_err(|_| NameError::InvalidHex(hex_name.to_string()))?;
    let name =
        decode_name_bytes(&bytes).ok_or_else(|| NameError::UnknownEncoding(hex_name.to_string()))?;

    let path = sanitize_page_name(&name);
    if path.is_empty() {
        return Err(NameError::Empty(hex_name.to_string()));
    }
    Ok(path)
}

/// Replace unsafe characters and drop path segments that would escape the
/// output tree.
pub fn sanitize_page_name(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    replaced
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace every decodable hex run in a line with its decoded text.
///
/// Runs that are not valid hex byte strings or do not decode are left as-is.
pub fn decode_hex_runs(line: &str) -> String {
    HEX_RUN
        .replace_all(line, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            hex::decode(run)
                .ok()
                .and_then(|bytes| decode_name_bytes(&bytes))
                .unwrap_or_else(|| run.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_front_page() {
        assert_eq!(decode_page_name("46726F6E7450616765").unwrap(), "FrontPage");
    }

    #[test]
    fn decodes_sub_pages() {
        // "cuemol2/Tube"
        let name = hex::encode_upper("cuemol2/Tube");
        assert_eq!(decode_page_name(&name).unwrap(), "cuemol2/Tube");
    }

    #[test]
    fn replaces_unsafe_characters() {
        assert_eq!(sanitize_page_name(r#"What?: "quoted""#), "What_ _quoted_");
        assert_eq!(sanitize_page_name("a/../b/./c"), "a/b/c");
        assert_eq!(sanitize_page_name("Getting Started/ Intro "), "Getting Started/ Intro ");
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(matches!(decode_page_name("XYZ"), Err(NameError::InvalidHex(_))));
        assert!(matches!(decode_page_name(""), Err(NameError::Empty(_))));
    }

    #[test]
    fn decodes_runs_in_listing() {
        let line = "  12 -rw-r--r-- 1 www 46726F6E7450616765.txt";
        assert_eq!(decode_hex_runs(line), "  12 -rw-r--r-- 1 www FrontPage.txt");
    }

    #[test]
    fn keeps_undecodable_runs() {
        assert_eq!(decode_hex_runs("ABCDE.txt"), "ABCDE.txt");
    }
}
