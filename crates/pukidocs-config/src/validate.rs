//! Site configuration validation against the docs tree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::nav::{is_external, pages};
use crate::site::{Locale, SiteConfig};

/// A problem found in the site configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Issue {
    #[error("docs directory does not exist: {0}")]
    DocsDirMissing(PathBuf),

    #[error("i18n plugin declares no languages")]
    NoLanguages,

    #[error("no locale is marked as default")]
    NoDefaultLocale,

    #[error("more than one default locale: {}", .0.join(", "))]
    MultipleDefaultLocales(Vec<String>),

    #[error("locale '{0}' is declared more than once")]
    DuplicateLocale(String),

    #[error("unsupported i18n docs_structure '{0}', only 'folder' is supported")]
    UnsupportedDocsStructure(String),

    #[error("locale '{locale}': navigation entry '{label}' points to missing file {path}")]
    MissingPage {
        locale: String,
        label: String,
        path: String,
    },
}

/// Check the configuration against the docs directory.
///
/// Returns every issue found; an empty list means the site can be built.
pub fn validate(config: &SiteConfig, docs_dir: &Path) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !docs_dir.is_dir() {
        issues.push(Issue::DocsDirMissing(docs_dir.to_path_buf()));
    }

    if let Some(i18n) = &config.i18n {
        if i18n.docs_structure != "folder" {
            issues.push(Issue::UnsupportedDocsStructure(i18n.docs_structure.clone()));
        }
        if i18n.languages.is_empty() {
            issues.push(Issue::NoLanguages);
        }
    }

    let locales = config.locales();
    check_locales(&locales, &mut issues);

    let default = config.default_locale();
    for locale in locales.iter().filter(|l| l.build || l.default) {
        check_nav(config, docs_dir, locale, default.as_ref(), &mut issues);
    }

    issues
}

fn check_locales(locales: &[Locale], issues: &mut Vec<Issue>) {
    let mut seen = HashSet::new();
    for locale in locales {
        if !seen.insert(locale.code.as_str()) {
            issues.push(Issue::DuplicateLocale(locale.code.clone()));
        }
    }

    let defaults: Vec<String> = locales
        .iter()
        .filter(|l| l.default)
        .map(|l| l.code.clone())
        .collect();
    match defaults.len() {
        0 if !locales.is_empty() => issues.push(Issue::NoDefaultLocale),
        0 | 1 => {}
        _ => issues.push(Issue::MultipleDefaultLocales(defaults)),
    }
}

fn check_nav(
    config: &SiteConfig,
    docs_dir: &Path,
    locale: &Locale,
    default: Option<&Locale>,
    issues: &mut Vec<Issue>,
) {
    let fallback = if config.fallback_to_default() && !locale.default {
        default
    } else {
        None
    };

    for page in pages(config.nav_for(locale)) {
        if is_external(page.path) {
            continue;
        }
        if resolve_page(docs_dir, locale, fallback, page.path).is_none() {
            issues.push(Issue::MissingPage {
                locale: locale.code.clone(),
                label: page.title.unwrap_or(page.path).to_string(),
                path: page.path.to_string(),
            });
        }
    }
}

/// Find the file a navigation path resolves to for a locale.
///
/// Looks in the locale's own folder first, then in the fallback locale's.
pub fn resolve_page(
    docs_dir: &Path,
    locale: &Locale,
    fallback: Option<&Locale>,
    path: &str,
) -> Option<PathBuf> {
    let path = path.split('#').next().unwrap_or(path).trim_start_matches('/');

    let own = docs_dir.join(&locale.content_dir).join(path);
    if own.is_file() {
        return Some(own);
    }

    fallback
        .map(|f| docs_dir.join(&f.content_dir).join(path))
        .filter(|p| p.is_file())
}
