//! Markdown rendering.
//!
//! Enabled `markdown_extensions` select pulldown-cmark features. Heading
//! ids are always generated so the table of contents can link to them.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;
use serde_yaml::Value;

use pukidocs_config::SiteConfig;

/// Renderer features derived from the site configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub definition_lists: bool,
    pub strikethrough: bool,
    pub tasklists: bool,

    /// `{ ... }` attribute blocks on headings and images
    pub attr_list: bool,

    /// Symbol of the heading permalink, `None` to omit it
    pub permalink: Option<String>,
}

impl MarkdownOptions {
    /// Map `markdown_extensions` entries to renderer features.
    pub fn from_config(site: &SiteConfig) -> Self {
        let mut options = Self::default();
        for extension in &site.markdown_extensions {
            match extension.name.as_str() {
                "tables" => options.tables = true,
                "footnotes" => options.footnotes = true,
                "def_list" => options.definition_lists = true,
                "pymdownx.tilde" => options.strikethrough = true,
                "pymdownx.tasklist" => options.tasklists = true,
                "attr_list" => options.attr_list = true,
                "toc" => options.permalink = permalink_symbol(&extension.options),
                other => tracing::debug!("Ignoring unsupported markdown extension '{}'", other),
            }
        }
        options
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.definition_lists {
            options.insert(Options::ENABLE_DEFINITION_LIST);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.attr_list {
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        options
    }
}

fn permalink_symbol(options: &Value) -> Option<String> {
    match options.get("permalink") {
        Some(Value::Bool(true)) => Some("¶".to_string()),
        Some(Value::String(symbol)) => Some(symbol.clone()),
        _ => None,
    }
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (2-6)
    pub level: u8,
}

/// A rendered Markdown page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,

    /// Text of the first level-1 heading
    pub title: Option<String>,

    pub toc: Vec<TocEntry>,
}

/// Render a page.
///
/// `is_index` tells whether the page is an `index.md`; other pages render
/// one directory deeper, which shifts relative `.md` links.
pub fn render(source: &str, options: &MarkdownOptions, is_index: bool) -> RenderedPage {
    render_page(source, options, is_index, None)
}

/// Render a page borrowed from another locale.
///
/// Relative image sources are resolved against `source_url`, the page's
/// URL in the locale it was written for, and emitted site-absolute. Links
/// stay relative so they lead to pages of the rendering locale.
pub fn render_relocated(
    source: &str,
    options: &MarkdownOptions,
    is_index: bool,
    source_url: &str,
) -> RenderedPage {
    render_page(source, options, is_index, Some(source_url))
}

fn render_page(
    source: &str,
    options: &MarkdownOptions,
    is_index: bool,
    image_base: Option<&str>,
) -> RenderedPage {
    let parser = TextMergeStream::new(Parser::new_ext(source, options.parser_options()));
    let events: Vec<Event> = parser
        .map(|event| rewrite_link(event, is_index))
        .map(|event| match image_base {
            Some(base) => rebase_image(event, base),
            None => event,
        })
        .collect();
    let events = if options.attr_list {
        apply_image_attributes(events)
    } else {
        events
    };

    let mut slugger = Slugger::default();
    let mut title = None;
    let mut toc = Vec::new();
    let mut out = Vec::with_capacity(events.len());

    let mut events = events.into_iter();
    while let Some(event) = events.next() {
        let (level, id, classes) = match event {
            Event::Start(Tag::Heading {
                level, id, classes, ..
            }) => (level, id, classes),
            other => {
                out.push(other);
                continue;
            }
        };

        let inner: Vec<Event> = events
            .by_ref()
            .take_while(|e| !matches!(e, Event::End(TagEnd::Heading(_))))
            .collect();
        let text = plain_text(&inner);
        let id = match id {
            Some(id) => slugger.reserve(id.to_string()),
            None => slugger.slugify(&text),
        };
        let level = level as u8;

        if level == 1 {
            title.get_or_insert_with(|| text.clone());
        } else {
            toc.push(TocEntry {
                title: text,
                id: id.clone(),
                level,
            });
        }

        let class = if classes.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
            format!(" class=\"{}\"", escape_html(&names.join(" ")))
        };
        out.push(Event::Html(
            format!("<h{} id=\"{}\"{}>", level, escape_html(&id), class).into(),
        ));
        out.extend(inner);
        if let Some(symbol) = &options.permalink {
            out.push(Event::Html(
                format!(
                    "<a class=\"headerlink\" href=\"#{}\" title=\"Permanent link\">{}</a>",
                    escape_html(&id),
                    escape_html(symbol)
                )
                .into(),
            ));
        }
        out.push(Event::Html(format!("</h{}>\n", level).into()));
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, out.into_iter());

    RenderedPage {
        html: html_output,
        title,
        toc,
    }
}

fn rewrite_link(event: Event<'_>, is_index: bool) -> Event<'_> {
    match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = match rewrite_md_link(&dest_url, is_index) {
                Some(url) => url.into(),
                None => dest_url,
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    }
}

fn rebase_image<'a>(event: Event<'a>, base: &str) -> Event<'a> {
    match event {
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = match resolve_relative(base, &dest_url) {
                Some(url) => url.into(),
                None => dest_url,
            };
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    }
}

/// Resolve a relative URL against the absolute directory URL `base`.
///
/// Returns `None` for absolute URLs, fragments and other links that are
/// not relative paths.
pub fn resolve_relative(base: &str, dest: &str) -> Option<String> {
    if dest.is_empty()
        || dest.contains("://")
        || dest.starts_with('/')
        || dest.starts_with('#')
        || dest.starts_with("data:")
        || dest.starts_with("mailto:")
    {
        return None;
    }

    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in dest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    Some(format!("/{}", segments.join("/")))
}

/// Rewrite a relative link to a `.md` file into its directory URL.
///
/// Returns `None` for links that are left alone.
pub fn rewrite_md_link(dest: &str, is_index: bool) -> Option<String> {
    if dest.contains("://")
        || dest.starts_with('/')
        || dest.starts_with('#')
        || dest.starts_with("mailto:")
    {
        return None;
    }

    let (path, fragment) = match dest.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (dest, None),
    };
    let stem = path.strip_suffix(".md")?;

    let dir = if stem == "index" {
        String::new()
    } else if let Some(parent) = stem.strip_suffix("/index") {
        format!("{}/", parent)
    } else {
        format!("{}/", stem)
    };

    let mut url = if is_index { dir } else { format!("../{}", dir) };
    if url.is_empty() {
        url.push_str("./");
    }
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    Some(url)
}

/// Turn `![alt](src){ .class #id key="value" }` into an `<img>` with attributes.
fn apply_image_attributes(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut events = events.into_iter().peekable();

    while let Some(event) = events.next() {
        let (link_type, dest_url, title, id) = match event {
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => (link_type, dest_url, title, id),
            other => {
                out.push(other);
                continue;
            }
        };

        let inner: Vec<Event> = events
            .by_ref()
            .take_while(|e| !matches!(e, Event::End(TagEnd::Image)))
            .collect();

        let attributes = match events.peek() {
            Some(Event::Text(text)) => split_attribute_block(text),
            _ => None,
        };

        match attributes {
            Some((attributes, rest)) => {
                events.next();
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(" title=\"{}\"", escape_html(&title))
                };
                out.push(Event::InlineHtml(
                    format!(
                        "<img src=\"{}\" alt=\"{}\"{}{}>",
                        escape_html(&dest_url),
                        escape_html(&plain_text(&inner)),
                        title_attr,
                        attributes
                    )
                    .into(),
                ));
                if !rest.is_empty() {
                    out.push(Event::Text(rest.into()));
                }
            }
            None => {
                out.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }));
                out.extend(inner);
                out.push(Event::End(TagEnd::Image));
            }
        }
    }

    out
}

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.([\w-]+)|#([\w-]+)|([\w-]+)="([^"]*)"|([\w-]+)=([^\s"]+)"#)
        .expect("Invalid attribute regex")
});

/// Split a leading `{ ... }` block off `text`, rendering it as HTML attributes.
fn split_attribute_block(text: &str) -> Option<(String, String)> {
    let body = text.strip_prefix('{')?;
    let end = body.find('}')?;
    let attributes = render_attributes(&body[..end]);
    Some((attributes, body[end + 1..].to_string()))
}

fn render_attributes(block: &str) -> String {
    let mut classes = Vec::new();
    let mut id = None;
    let mut pairs = Vec::new();

    for caps in ATTRIBUTE.captures_iter(block) {
        if let Some(class) = caps.get(1) {
            classes.push(class.as_str());
        } else if let Some(anchor) = caps.get(2) {
            id = Some(anchor.as_str());
        } else if let (Some(key), Some(value)) = (caps.get(3), caps.get(4)) {
            pairs.push((key.as_str(), value.as_str()));
        } else if let (Some(key), Some(value)) = (caps.get(5), caps.get(6)) {
            pairs.push((key.as_str(), value.as_str()));
        }
    }

    let mut out = String::new();
    if let Some(id) = id {
        out.push_str(&format!(" id=\"{}\"", escape_html(id)));
    }
    if !classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
    }
    for (key, value) in pairs {
        out.push_str(&format!(" {}=\"{}\"", key, escape_html(value)));
    }
    out
}

fn plain_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        if let Event::Text(t) | Event::Code(t) = event {
            text.push_str(t);
        }
    }
    text
}

/// Unique heading slugs within one page.
#[derive(Default)]
struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    fn slugify(&mut self, text: &str) -> String {
        let slug = slugify(text);
        let slug = if slug.is_empty() {
            "section".to_string()
        } else {
            slug
        };
        self.reserve(slug)
    }

    fn reserve(&mut self, slug: String) -> String {
        match self.seen.get_mut(&slug) {
            Some(count) => {
                *count += 1;
                format!("{}_{}", slug, count)
            }
            None => {
                self.seen.insert(slug.clone(), 0);
                slug
            }
        }
    }
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Escape text for HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid space regex"));

/// Plain text of rendered HTML, for the search index.
pub fn html_to_text(html: &str) -> String {
    let text = TAG.replace_all(html, " ");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    SPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all() -> MarkdownOptions {
        MarkdownOptions {
            tables: true,
            footnotes: true,
            definition_lists: true,
            strikethrough: true,
            tasklists: true,
            attr_list: true,
            permalink: Some("¶".to_string()),
        }
    }

    #[test]
    fn maps_extensions_from_config() {
        let site = SiteConfig::from_yaml(
            r#"
site_name: Docs
markdown_extensions:
  - tables
  - pymdownx.tilde
  - admonition
  - toc:
      permalink: true
"#,
        )
        .unwrap();
        let options = MarkdownOptions::from_config(&site);

        assert!(options.tables);
        assert!(options.strikethrough);
        assert!(!options.footnotes);
        assert_eq!(options.permalink.as_deref(), Some("¶"));
    }

    #[test]
    fn generates_heading_ids_and_toc() {
        let page = render(
            "# Title\n\n## 概要\n\n## Setup\n\n## Setup\n",
            &MarkdownOptions::default(),
            true,
        );

        assert_eq!(page.title.as_deref(), Some("Title"));
        let ids: Vec<&str> = page.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["概要", "setup", "setup_1"]);
        assert!(page.html.contains("<h2 id=\"setup_1\">Setup</h2>"));
        assert!(!page.html.contains("headerlink"));
    }

    #[test]
    fn keeps_explicit_heading_ids_with_permalink() {
        let page = render("## Install { #a1b2 }\n", &all(), true);

        assert_eq!(page.toc[0].id, "a1b2");
        assert!(page
            .html
            .contains("<a class=\"headerlink\" href=\"#a1b2\" title=\"Permanent link\">¶</a></h2>"));
    }

    #[test]
    fn resolves_relative_urls() {
        assert_eq!(
            resolve_relative("/docs/Download/", "../assets/images/Download/tube.png"),
            Some("/docs/assets/images/Download/tube.png".to_string())
        );
        assert_eq!(
            resolve_relative("/", "./img/a.png"),
            Some("/img/a.png".to_string())
        );
        assert_eq!(resolve_relative("/docs/", "https://example.com/a.png"), None);
        assert_eq!(resolve_relative("/docs/", "/a.png"), None);
    }

    #[test]
    fn relocated_pages_use_absolute_image_sources() {
        let source = "![tube](../assets/images/Tube/tube.png){ .on-glb }\n\n[Ribbon](../Ribbon)\n";
        let page = render_relocated(source, &all(), false, "/Tube/");

        assert!(page
            .html
            .contains("<img src=\"/assets/images/Tube/tube.png\" alt=\"tube\" class=\"on-glb\">"));
        assert!(page.html.contains("<a href=\"../Ribbon\">Ribbon</a>"));
    }

    #[test]
    fn applies_image_attributes() {
        let page = render(
            "![tube](../assets/images/Tube/tube.png){ .on-glb style=\"zoom: 0.5\" }\n",
            &all(),
            false,
        );

        assert!(page.html.contains(
            "<img src=\"../assets/images/Tube/tube.png\" alt=\"tube\" class=\"on-glb\" style=\"zoom: 0.5\">"
        ));
        assert!(!page.html.contains('{'));
    }

    #[test]
    fn leaves_attribute_text_without_attr_list() {
        let page = render("![a](a.png){ .on-glb }\n", &MarkdownOptions::default(), true);
        assert!(page.html.contains("<img src=\"a.png\" alt=\"a\" />"));
        assert!(page.html.contains("{ .on-glb }"));
    }

    #[test]
    fn rewrites_markdown_links() {
        assert_eq!(rewrite_md_link("guide.md", true).as_deref(), Some("guide/"));
        assert_eq!(rewrite_md_link("guide.md", false).as_deref(), Some("../guide/"));
        assert_eq!(rewrite_md_link("sub/index.md#top", true).as_deref(), Some("sub/#top"));
        assert_eq!(rewrite_md_link("index.md", true).as_deref(), Some("./"));
        assert_eq!(rewrite_md_link("index.md", false).as_deref(), Some("../"));
        assert_eq!(rewrite_md_link("../Download", false), None);
        assert_eq!(rewrite_md_link("https://example.com/a.md", true), None);

        let page = render("[Guide](guide.md)", &MarkdownOptions::default(), false);
        assert!(page.html.contains("<a href=\"../guide/\">Guide</a>"));
    }

    #[test]
    fn renders_enabled_extensions() {
        let source = "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\nterm\n: description\n";
        let page = render(source, &all(), true);

        assert!(page.html.contains("<table>"));
        assert!(page.html.contains("<del>gone</del>"));
        assert!(page.html.contains("<dt>term</dt>"));

        let plain = render(source, &MarkdownOptions::default(), true);
        assert!(!plain.html.contains("<table>"));
        assert!(!plain.html.contains("<del>"));
    }

    #[test]
    fn extracts_plain_text() {
        assert_eq!(
            html_to_text("<h2 id=\"a\">A &amp; B</h2>\n<p>one\ntwo</p>"),
            "A & B one two"
        );
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Button (Primary)"), "button-primary");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }
}
