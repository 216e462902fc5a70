//! Navigation tree and directory-style URLs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use pukidocs_config::NavEntry;

/// A navigation item as seen by templates.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// URL, `None` for sections
    pub url: Option<String>,
    /// Child items
    pub children: Vec<NavItem>,
    /// Whether this is the active page or contains it
    pub active: bool,
    /// Whether the URL leaves the site
    pub external: bool,
}

impl NavItem {
    fn link(title: String, url: String, external: bool) -> Self {
        Self {
            title,
            url: Some(url),
            children: Vec::new(),
            active: false,
            external,
        }
    }

    fn section(title: String, children: Vec<NavItem>) -> Self {
        Self {
            title,
            url: None,
            children,
            active: false,
            external: false,
        }
    }
}

/// Whether a page path is a directory index.
pub fn is_index(path: &str) -> bool {
    path == "index.md" || path.ends_with("/index.md")
}

/// Directory-style URL of a page, relative to the locale root.
///
/// `index.md` maps to the empty string, `foo/bar.md` to `foo/bar/`.
/// Anchors are kept; paths that are not Markdown files are returned as is.
pub fn page_url(path: &str) -> String {
    let (path, fragment) = match path.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (path, None),
    };
    let path = path.trim_start_matches('/');

    let mut url = match path.strip_suffix(".md") {
        Some("index") => String::new(),
        Some(stem) => match stem.strip_suffix("/index") {
            Some(parent) => format!("{}/", parent),
            None => format!("{}/", stem),
        },
        None => path.to_string(),
    };
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

/// Output file of a page relative to the locale's output root.
pub fn output_file(path: &str) -> PathBuf {
    PathBuf::from(page_url(path)).join("index.html")
}

/// Title for a page that has none, derived from its path.
pub fn title_from_path(path: &str) -> String {
    let stem = path.trim_end_matches(".md");
    let stem = stem.strip_suffix("/index").unwrap_or(stem);
    if stem == "index" {
        return "Home".to_string();
    }
    let name = stem.rsplit('/').next().unwrap_or(stem);
    name.replace('_', " ")
}

/// Build navigation items from configured entries.
///
/// `prefix` is prepended to every internal URL (base URL and locale folder).
pub fn from_config(entries: &[NavEntry], prefix: &str) -> Vec<NavItem> {
    entries
        .iter()
        .map(|entry| match entry {
            NavEntry::Page { title, path } => {
                let external = pukidocs_config::nav::is_external(path);
                let url = if external {
                    path.clone()
                } else {
                    format!("{}{}", prefix, page_url(path))
                };
                let title = title.clone().unwrap_or_else(|| title_from_path(path));
                NavItem::link(title, url, external)
            }
            NavEntry::Section { title, children } => {
                NavItem::section(title.clone(), from_config(children, prefix))
            }
        })
        .collect()
}

/// Build navigation from the page files of a locale.
///
/// Top-level pages come first with `index.md` leading, then one section
/// per directory in path order.
pub fn from_pages(pages: &[String], prefix: &str) -> Vec<NavItem> {
    let mut root: Vec<&String> = Vec::new();
    let mut dirs: BTreeMap<&str, Vec<&String>> = BTreeMap::new();

    for page in pages {
        match page.rsplit_once('/') {
            Some((dir, _)) => dirs.entry(dir).or_default().push(page),
            None => root.push(page),
        }
    }

    let item = |page: &String| {
        NavItem::link(
            title_from_path(page),
            format!("{}{}", prefix, page_url(page)),
            false,
        )
    };

    root.sort_by(|a, b| (!is_index(a), a).cmp(&(!is_index(b), b)));
    let mut nav: Vec<NavItem> = root.into_iter().map(item).collect();

    for (dir, mut pages) in dirs {
        pages.sort_by(|a, b| (!is_index(a), a).cmp(&(!is_index(b), b)));
        let name = dir.rsplit('/').next().unwrap_or(dir);
        nav.push(NavItem::section(
            capitalize(&name.replace('_', " ")),
            pages.into_iter().map(item).collect(),
        ));
    }

    nav
}

/// Mark the item pointing at `url` and its ancestors active.
pub fn mark_active(items: &mut [NavItem], url: &str) -> bool {
    let mut found = false;
    for item in items.iter_mut() {
        let child_active = mark_active(&mut item.children, url);
        let self_active = item.url.as_deref() == Some(url);
        item.active = child_active || self_active;
        found |= item.active;
    }
    found
}

/// Title of the item pointing at `url`.
pub fn find_title<'a>(items: &'a [NavItem], url: &str) -> Option<&'a str> {
    items.iter().find_map(|item| {
        if item.url.as_deref() == Some(url) {
            Some(item.title.as_str())
        } else {
            find_title(&item.children, url)
        }
    })
}

/// Capitalize first letter of a string.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
