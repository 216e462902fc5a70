//! Internal link rewriting.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::encoding::decode_name_bytes;
use crate::pagename::sanitize_page_name;

static ALIAS_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^>\]]+)>([^>\]]+)\]\]").expect("Invalid alias link regex")
});

static COLON_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^:\]]+):([^>\]]+)\]\]").expect("Invalid colon link regex")
});

static BARE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^>\]]+)\]\]").expect("Invalid bare link regex"));

static WIKI_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(\w+)/index\.php\?(.+)").expect("Invalid wiki url regex")
});

/// Where a page lives in the converted tree.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Page path without extension, e.g. `cuemol2/Tube` or `index`
    pub page: String,
    /// Locale the page is converted for
    pub locale: String,
    /// Locale rendered at the site root
    pub default_locale: String,
    /// Image directory relative to the docs root
    pub images_dir: String,
}

impl PageContext {
    /// Create a context for a page.
    pub fn new(
        page: impl Into<String>,
        locale: impl Into<String>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            page: page.into(),
            locale: locale.into(),
            default_locale: default_locale.into(),
            images_dir: "assets/images".to_string(),
        }
    }

    /// Whether `locale` (or the page's own locale) is rendered at the site root.
    pub fn is_default_locale(&self, locale: Option<&str>) -> bool {
        locale.unwrap_or(&self.locale) == self.default_locale
    }

    /// Relative path from the page's directory-style URL back to the site root.
    ///
    /// `index` renders at its folder URL, every other page one level deeper.
    pub fn top_dir(&self) -> String {
        let mut segments: Vec<&str> = self.page.split('/').collect();
        if segments.last() == Some(&"index") {
            segments.pop();
        }

        let mut depth = segments.len();
        if !self.is_default_locale(None) {
            depth += 1;
        }

        if depth == 0 {
            ".".to_string()
        } else {
            vec![".."; depth].join("/")
        }
    }

    /// Parent path of the page (`.` for top level pages).
    pub fn parent(&self) -> &str {
        match self.page.rfind('/') {
            Some(pos) => &self.page[..pos],
            None => ".",
        }
    }

    /// Locale prefix for links into the page's own locale.
    fn locale_prefix(&self) -> Option<&str> {
        if self.is_default_locale(None) {
            None
        } else {
            Some(&self.locale)
        }
    }
}

/// Join URL parts, skipping empty and `.` segments.
pub(crate) fn join_url(parts: &[&str]) -> String {
    let segments: Vec<&str> = parts
        .iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Rewrite `[[...]]` links into Markdown links.
pub fn convert_internal_links(content: &str, ctx: &PageContext) -> String {
    let result = ALIAS_LINK.replace_all(content, |caps: &Captures<'_>| {
        render_link(&caps[1], &caps[2], ctx)
    });

    let result = COLON_LINK.replace_all(&result, |caps: &Captures<'_>| {
        let (text, target) = (&caps[1], &caps[2]);
        // [[http://example.com]] also matches the colon form
        if (text == "http" || text == "https") && target.starts_with("//") {
            let url = &caps[0][2..caps[0].len() - 2];
            render_link(url, url, ctx)
        } else {
            render_link(text, target, ctx)
        }
    });

    BARE_LINK
        .replace_all(&result, |caps: &Captures<'_>| render_link(&caps[1], &caps[1], ctx))
        .into_owned()
}

fn render_link(text: &str, target: &str, ctx: &PageContext) -> String {
    let text = text.trim();
    let target = target.trim();
    format!("[{}]({})", text, link_destination(&resolve_target(target, ctx)))
}

/// Markdown link destination for a URL.
///
/// Page names may contain spaces or parentheses, which end a bare
/// destination; those are wrapped in `<...>`.
pub(crate) fn link_destination(url: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{}>", url)
    } else {
        url.to_string()
    }
}

/// Resolve a wiki link target into a relative URL.
pub fn resolve_target(target: &str, ctx: &PageContext) -> String {
    if let Some(anchor) = target.strip_prefix('#') {
        return format!("#{}", anchor);
    }

    let top = ctx.top_dir();
    let prefix = ctx.locale_prefix().unwrap_or("");

    if let Some(rel) = target.strip_prefix("./") {
        return join_url(&[&top, prefix, &ctx.page, rel]);
    }

    if let Some(rel) = target.strip_prefix("../") {
        return join_url(&[&top, prefix, ctx.parent(), rel]);
    }

    if let Some(caps) = WIKI_URL.captures(target) {
        let lang = &caps[1];
        let page = decode_query_page(&caps[2]);
        if ctx.is_default_locale(Some(lang)) {
            return join_url(&[&top, &page]);
        }
        return join_url(&[&top, lang, &page]);
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }

    join_url(&[&top, prefix, target])
}

fn decode_query_page(query: &str) -> String {
    let bytes: Vec<u8> = percent_decode_str(query).collect();
    let name = decode_name_bytes(&bytes).unwrap_or_else(|| query.to_string());
    sanitize_page_name(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ja(page: &str) -> PageContext {
        PageContext::new(page, "ja", "ja")
    }

    fn en(page: &str) -> PageContext {
        PageContext::new(page, "en", "ja")
    }

    #[test]
    fn computes_top_dir() {
        assert_eq!(ja("index").top_dir(), ".");
        assert_eq!(ja("Download").top_dir(), "..");
        assert_eq!(ja("cuemol2/Tube").top_dir(), "../..");
        assert_eq!(en("index").top_dir(), "..");
        assert_eq!(en("cuemol2/Tube").top_dir(), "../../..");
        assert_eq!(ja("cuemol2/index").top_dir(), "..");
    }

    #[test]
    fn rewrites_plain_links() {
        let out = convert_internal_links("see [[Download]] now", &ja("cuemol2/Tube"));
        assert_eq!(out, "see [Download](../../Download) now");
    }

    #[test]
    fn rewrites_alias_links_in_other_locale() {
        let out = convert_internal_links("[[Get it>Download]]", &en("Manual"));
        assert_eq!(out, "[Get it](../../en/Download)");
    }

    #[test]
    fn rewrites_relative_links() {
        let ctx = ja("cuemol2/Tube");
        assert_eq!(
            convert_internal_links("[[Child>./Sub]]", &ctx),
            "[Child](../../cuemol2/Tube/Sub)"
        );
        assert_eq!(
            convert_internal_links("[[Sibling>../Ribbon]]", &ctx),
            "[Sibling](../../cuemol2/Ribbon)"
        );
    }

    #[test]
    fn keeps_anchors_and_urls() {
        let ctx = ja("Download");
        assert_eq!(convert_internal_links("[[Top>#top]]", &ctx), "[Top](#top)");
        assert_eq!(
            convert_internal_links("[[Site>http://example.com/]]", &ctx),
            "[Site](http://example.com/)"
        );
        assert_eq!(
            convert_internal_links("[[https://example.com/x]]", &ctx),
            "[https://example.com/x](https://example.com/x)"
        );
    }

    #[test]
    fn wraps_destinations_with_spaces() {
        let out = convert_internal_links("See [[Getting Started]] and [[Tube]]", &ja("index"));
        assert_eq!(out, "See [Getting Started](<Getting Started>) and [Tube](Tube)");
    }

    #[test]
    fn spaced_links_render_as_anchors() {
        let markdown = convert_internal_links("See [[Getting Started]] and [[Tube]]", &ja("index"));
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, pulldown_cmark::Parser::new(&markdown));

        assert!(html.contains(">Getting Started</a>"));
        assert!(html.contains("<a href=\"Tube\">Tube</a>"));
        assert!(!html.contains("]("));
    }

    #[test]
    fn rewrites_colon_links() {
        let out = convert_internal_links("[[Guide:Install]]", &ja("index"));
        assert_eq!(out, "[Guide](Install)");
    }

    #[test]
    fn rewrites_legacy_wiki_urls() {
        let ctx = ja("index");
        let out = convert_internal_links(
            "[[Ball>http://www.cuemol.org/en/index.php?cuemol2%2FBallStickRenderer]]",
            &ctx,
        );
        assert_eq!(out, "[Ball](en/cuemol2/BallStickRenderer)");

        let out = convert_internal_links(
            "[[Ball>http://www.cuemol.org/ja/index.php?cuemol2%2FBallStickRenderer]]",
            &ctx,
        );
        assert_eq!(out, "[Ball](cuemol2/BallStickRenderer)");
    }
}
