//! Character encoding detection for wiki sources.

use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8};

/// Encodings tried, in order, when the source is not valid UTF-8.
const FALLBACK_ENCODINGS: [&Encoding; 3] = [EUC_JP, SHIFT_JIS, ISO_2022_JP];

/// How page sources are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceEncoding {
    /// Detect per file
    #[default]
    Auto,
    /// Always decode with the given encoding
    Forced(&'static Encoding),
}

impl SourceEncoding {
    /// Parse an encoding label such as `euc-jp` or `shift_jis`.
    ///
    /// `auto` selects detection. Returns `None` for unknown labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("auto") {
            return Some(Self::Auto);
        }
        Encoding::for_label(label.as_bytes()).map(Self::Forced)
    }
}

/// Result of decoding a source file.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// Decoded text with `\n` line endings
    pub text: String,
    /// Encoding that was used
    pub encoding: &'static Encoding,
    /// Whether malformed sequences were replaced
    pub lossy: bool,
}

/// Decode raw page bytes.
pub fn decode_source(bytes: &[u8], mode: SourceEncoding) -> Decoded {
    let (text, encoding, lossy) = match mode {
        SourceEncoding::Forced(encoding) => {
            let (text, lossy) = encoding.decode_without_bom_handling(bytes);
            (text.into_owned(), encoding, lossy)
        }
        SourceEncoding::Auto => detect(bytes),
    };

    Decoded {
        text: normalize_newlines(&text),
        encoding,
        lossy,
    }
}

fn detect(bytes: &[u8]) -> (String, &'static Encoding, bool) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8, false);
    }

    for encoding in FALLBACK_ENCODINGS {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return (text.into_owned(), encoding, false);
        }
    }

    let (text, _) = EUC_JP.decode_without_bom_handling(bytes);
    (text.into_owned(), EUC_JP, true)
}

/// Decode the bytes of a hex-encoded page or file name.
///
/// PukiWiki stores names either as EUC-JP or UTF-8; EUC-JP is tried first.
pub fn decode_name_bytes(bytes: &[u8]) -> Option<String> {
    if let Some(text) = EUC_JP.decode_without_bom_handling_and_without_replacement(bytes) {
        return Some(text.into_owned());
    }
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_utf8() {
        let decoded = decode_source("日本語".as_bytes(), SourceEncoding::Auto);

        assert_eq!(decoded.text, "日本語");
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
    }

    #[test]
    fn falls_back_to_euc_jp() {
        let (bytes, _, _) = EUC_JP.encode("ページ");
        let decoded = decode_source(&bytes, SourceEncoding::Auto);

        assert_eq!(decoded.text, "ページ");
        assert_eq!(decoded.encoding, EUC_JP);
    }

    #[test]
    fn detects_shift_jis() {
        // 0x83 lead bytes are invalid in EUC-JP
        let (bytes, _, _) = SHIFT_JIS.encode("アイウ");
        let decoded = decode_source(&bytes, SourceEncoding::Auto);

        assert_eq!(decoded.text, "アイウ");
        assert_eq!(decoded.encoding, SHIFT_JIS);
        assert!(!decoded.lossy);
    }

    #[test]
    fn undecodable_bytes_fall_back_to_lossy_euc_jp() {
        let decoded = decode_source(b"ab\xFFcd", SourceEncoding::Auto);

        assert_eq!(decoded.text, "ab\u{FFFD}cd");
        assert_eq!(decoded.encoding, EUC_JP);
        assert!(decoded.lossy);
    }

    #[test]
    fn forced_encoding_is_used() {
        let (bytes, _, _) = SHIFT_JIS.encode("表示");
        let mode = SourceEncoding::from_label("shift_jis").unwrap();
        let decoded = decode_source(&bytes, mode);

        assert_eq!(decoded.text, "表示");
        assert_eq!(decoded.encoding, SHIFT_JIS);
    }

    #[test]
    fn normalizes_line_endings() {
        let decoded = decode_source(b"a\r\nb\rc", SourceEncoding::Auto);
        assert_eq!(decoded.text, "a\nb\nc");
    }

    #[test]
    fn parses_labels() {
        assert_eq!(SourceEncoding::from_label("auto"), Some(SourceEncoding::Auto));
        assert_eq!(
            SourceEncoding::from_label("EUC-JP"),
            Some(SourceEncoding::Forced(EUC_JP))
        );
        assert_eq!(SourceEncoding::from_label("no-such-encoding"), None);
    }

    #[test]
    fn decodes_names() {
        assert_eq!(decode_name_bytes(b"FrontPage"), Some("FrontPage".to_string()));
        let (bytes, _, _) = EUC_JP.encode("日本");
        assert_eq!(decode_name_bytes(&bytes), Some("日本".to_string()));
    }
}
