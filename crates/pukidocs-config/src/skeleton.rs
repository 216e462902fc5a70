//! Site configuration skeleton for freshly converted docs.

use std::path::PathBuf;

use serde_yaml::{Mapping, Value};

use crate::nav::NavEntry;
use crate::site::{I18nOptions, LanguageConfig, NamedEntry, SiteConfig, ThemeConfig};

/// Display name for well-known locale codes.
fn locale_name(code: &str) -> String {
    match code {
        "ja" => "日本語".to_string(),
        "en" => "English".to_string(),
        "de" => "Deutsch".to_string(),
        "fr" => "Français".to_string(),
        "zh" => "中文".to_string(),
        "ko" => "한국어".to_string(),
        other => other.to_string(),
    }
}

fn home_label(code: &str) -> &'static str {
    match code {
        "ja" => "ホーム",
        _ => "Home",
    }
}

/// Build a configuration for a converted docs tree.
///
/// `pages` are the converted page names of the default locale; top level
/// pages become navigation entries, `index` first when it was converted.
pub fn skeleton(
    site_name: &str,
    docs_dir: PathBuf,
    default_locale: &str,
    locales: &[String],
    pages: &[String],
) -> SiteConfig {
    let languages: Vec<LanguageConfig> = locales
        .iter()
        .map(|code| LanguageConfig {
            locale: code.clone(),
            name: locale_name(code),
            default: code == default_locale,
            build: true,
            site_name: None,
            nav: None,
        })
        .collect();

    let mut nav = Vec::new();
    if pages.iter().any(|p| p == "index") {
        nav.push(NavEntry::page(home_label(default_locale), "index.md"));
    }
    let mut top_level: Vec<&String> = pages
        .iter()
        .filter(|p| p.as_str() != "index" && !p.contains('/'))
        .collect();
    top_level.sort();
    nav.extend(
        top_level
            .into_iter()
            .map(|p| NavEntry::page(p.replace('_', " "), format!("{}.md", p))),
    );

    let alternate: Vec<Value> = languages
        .iter()
        .map(|lang| {
            let link = if lang.default {
                "/".to_string()
            } else {
                format!("/{}/", lang.locale)
            };
            let mut entry = Mapping::new();
            entry.insert("name".into(), lang.name.clone().into());
            entry.insert("link".into(), link.into());
            entry.insert("lang".into(), lang.locale.clone().into());
            Value::Mapping(entry)
        })
        .collect();
    let mut extra = Mapping::new();
    extra.insert("alternate".into(), Value::Sequence(alternate));

    let mut toc = Mapping::new();
    toc.insert("permalink".into(), true.into());

    let i18n = I18nOptions {
        docs_structure: "folder".to_string(),
        fallback_to_default: true,
        languages,
    };

    SiteConfig {
        site_name: site_name.to_string(),
        site_url: None,
        site_description: Some("Migrated from PukiWiki".to_string()),
        site_author: None,
        docs_dir,
        site_dir: PathBuf::from("site"),
        dev_addr: "127.0.0.1:8000".to_string(),
        theme: ThemeConfig {
            name: "material".to_string(),
            language: Some(default_locale.to_string()),
            features: vec![
                "navigation.tabs".to_string(),
                "navigation.sections".to_string(),
                "search.highlight".to_string(),
            ],
        },
        plugins: vec![NamedEntry::bare("search"), NamedEntry::bare("glightbox")],
        markdown_extensions: vec![
            NamedEntry::bare("attr_list"),
            NamedEntry::bare("def_list"),
            NamedEntry::bare("tables"),
            NamedEntry::bare("footnotes"),
            NamedEntry::bare("md_in_html"),
            NamedEntry::bare("pymdownx.tilde"),
            NamedEntry::with_options("toc", Value::Mapping(toc)),
        ],
        extra,
        nav,
        i18n: Some(i18n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::pages as nav_pages;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_localized_skeleton() {
        let pages = vec![
            "index".to_string(),
            "Download".to_string(),
            "cuemol2/Tube".to_string(),
            "Getting_Started".to_string(),
        ];
        let config = skeleton(
            "CueMol",
            PathBuf::from("docs"),
            "ja",
            &["ja".to_string(), "en".to_string()],
            &pages,
        );

        let paths: Vec<&str> = nav_pages(&config.nav).iter().map(|p| p.path).collect();
        assert_eq!(paths, vec!["index.md", "Download.md", "Getting_Started.md"]);
        assert_eq!(config.nav[2], NavEntry::page("Getting Started", "Getting_Started.md"));

        let locales = config.locales();
        assert_eq!(locales.len(), 2);
        assert!(locales[0].default);
        assert_eq!(locales[1].name, "English");
    }

    #[test]
    fn omits_home_without_start_page() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("docs/en")).unwrap();
        std::fs::write(temp.path().join("docs/en/Guide.md"), "# Guide\n").unwrap();

        let config = skeleton(
            "Docs",
            PathBuf::from("docs"),
            "en",
            &["en".to_string()],
            &["Guide".to_string()],
        );

        assert_eq!(config.nav, vec![NavEntry::page("Guide", "Guide.md")]);
        assert!(crate::validate(&config, &temp.path().join("docs")).is_empty());
    }

    #[test]
    fn skeleton_survives_yaml_round_trip() {
        let config = skeleton(
            "Docs",
            PathBuf::from("docs"),
            "en",
            &["en".to_string()],
            &["index".to_string()],
        );
        let yaml = config.to_yaml().unwrap();
        let parsed = SiteConfig::from_yaml(&yaml).unwrap();

        assert_eq!(parsed.locales(), config.locales());
        assert!(yaml.contains("i18n"));
        assert!(yaml.contains("permalink: true"));
    }
}
