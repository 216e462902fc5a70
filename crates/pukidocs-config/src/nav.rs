//! Navigation tree entries.
//!
//! An entry is written in one of three shapes:
//!
//! ```yaml
//! nav:
//!   - index.md                 # bare path
//!   - Download: download.md    # labelled page
//!   - Manual:                  # section
//!       - manual/index.md
//!       - Tube: manual/tube.md
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

/// A navigation entry.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEntry {
    /// A page or external link
    Page {
        /// Label, defaults to the page title
        title: Option<String>,
        /// Path relative to the locale content root, or an absolute URL
        path: String,
    },

    /// A labelled group of entries
    Section {
        title: String,
        children: Vec<NavEntry>,
    },
}

/// A flattened page entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavPage<'a> {
    pub title: Option<&'a str>,
    pub path: &'a str,
}

impl NavEntry {
    /// A labelled page entry.
    pub fn page(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Page {
            title: Some(title.into()),
            path: path.into(),
        }
    }

    /// A section entry.
    pub fn section(title: impl Into<String>, children: Vec<NavEntry>) -> Self {
        Self::Section {
            title: title.into(),
            children,
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(path) => Ok(Self::Page { title: None, path }),
            Value::Mapping(map) if map.len() == 1 => {
                let Some((key, value)) = map.into_iter().next() else {
                    return Err("empty navigation entry".to_string());
                };
                let title = match key {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    other => return Err(format!("invalid navigation label: {:?}", other)),
                };
                match value {
                    Value::String(path) => Ok(Self::Page {
                        title: Some(title),
                        path,
                    }),
                    Value::Sequence(items) => {
                        let children = items
                            .into_iter()
                            .map(Self::from_value)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Self::Section { title, children })
                    }
                    _ => Err(format!(
                        "navigation entry '{}' must map to a path or a list",
                        title
                    )),
                }
            }
            Value::Mapping(_) => {
                Err("navigation entry must have exactly one label".to_string())
            }
            other => Err(format!("invalid navigation entry: {:?}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for NavEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for NavEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Page { title: None, path } => serializer.serialize_str(path),
            Self::Page {
                title: Some(title),
                path,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(title, path)?;
                map.end()
            }
            Self::Section { title, children } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(title, children)?;
                map.end()
            }
        }
    }
}

/// Whether a navigation path points outside the site.
pub fn is_external(path: &str) -> bool {
    path.contains("://") || path.starts_with("mailto:")
}

/// Flatten a navigation tree into its page entries, in order.
pub fn pages(entries: &[NavEntry]) -> Vec<NavPage<'_>> {
    let mut out = Vec::new();
    collect_pages(entries, &mut out);
    out
}

fn collect_pages<'a>(entries: &'a [NavEntry], out: &mut Vec<NavPage<'a>>) {
    for entry in entries {
        match entry {
            NavEntry::Page { title, path } => out.push(NavPage {
                title: title.as_deref(),
                path,
            }),
            NavEntry::Section { children, .. } => collect_pages(children, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_all_entry_shapes() {
        let yaml = r#"
- index.md
- Download: download.md
- Manual:
    - manual/index.md
    - Tube: manual/tube.md
"#;
        let nav: Vec<NavEntry> = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            nav,
            vec![
                NavEntry::Page {
                    title: None,
                    path: "index.md".to_string()
                },
                NavEntry::page("Download", "download.md"),
                NavEntry::section(
                    "Manual",
                    vec![
                        NavEntry::Page {
                            title: None,
                            path: "manual/index.md".to_string()
                        },
                        NavEntry::page("Tube", "manual/tube.md"),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn rejects_multi_key_entries() {
        let yaml = "- {A: a.md, B: b.md}";
        let result: Result<Vec<NavEntry>, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn serializes_back_to_same_shape() {
        let nav = vec![
            NavEntry::page("Home", "index.md"),
            NavEntry::section("Guide", vec![NavEntry::page("Install", "install.md")]),
        ];
        let yaml = serde_yaml::to_string(&nav).unwrap();
        let parsed: Vec<NavEntry> = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, nav);
        assert!(yaml.contains("Home: index.md"));
    }

    #[test]
    fn flattens_pages() {
        let nav = vec![
            NavEntry::page("Home", "index.md"),
            NavEntry::section("Guide", vec![NavEntry::page("Install", "install.md")]),
            NavEntry::page("Site", "https://example.com/"),
        ];
        let paths: Vec<&str> = pages(&nav).iter().map(|p| p.path).collect();

        assert_eq!(paths, vec!["index.md", "install.md", "https://example.com/"]);
        assert!(is_external("https://example.com/"));
        assert!(!is_external("install.md"));
    }
}
