//! Static site builder.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde_yaml::Value;
use walkdir::WalkDir;

use pukidocs_config::{validate, Issue, Locale, SiteConfig};

use crate::assets::AssetPipeline;
use crate::markdown::{self, escape_html, MarkdownOptions};
use crate::navigation::{self, NavItem};
use crate::templates::{Alternate, Context, TemplateEngine};

/// Extensions under the docs directory that are never copied to the site.
const SKIPPED_EXTENSIONS: &[&str] = &["md", "pwtxt"];

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Site configuration
    pub site: SiteConfig,

    /// Source docs directory
    pub docs_dir: PathBuf,

    /// Output directory
    pub site_dir: PathBuf,

    /// Base URL for the site, ends with `/`
    pub base_url: String,

    /// Minify CSS output
    pub minify: bool,

    /// Remove the output directory before building
    pub clean: bool,

    /// Live reload script URL injected into every page
    pub live_reload: Option<String>,
}

impl BuildConfig {
    /// Resolve the site's directories against the project root.
    pub fn new(site: SiteConfig, root: &Path) -> Self {
        Self {
            docs_dir: root.join(&site.docs_dir),
            site_dir: root.join(&site.site_dir),
            base_url: site.base_path(),
            minify: true,
            clean: false,
            live_reload: None,
            site,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Pages rendered from the default locale's file
    pub fallback_pages: usize,

    /// Number of files copied from the docs directory
    pub assets: usize,

    /// Locales that were built
    pub locales: Vec<String>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid site configuration:\n{}", format_issues(.0))]
    InvalidConfig(Vec<Issue>),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template for {page}: {source}")]
    Template {
        page: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to serialize search index: {0}")]
    SearchIndex(#[from] serde_json::Error),

    #[error("Refusing to clean {0}: it contains the docs directory")]
    UnsafeClean(PathBuf),
}

fn format_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A locale being built.
struct LocaleSite {
    locale: Locale,

    /// Base URL plus the locale folder
    prefix: String,

    nav: Vec<NavItem>,

    /// Pages rendered for the locale, including fallbacks
    pages: BTreeSet<String>,
}

/// A page to be built.
#[derive(Debug)]
struct PageJob {
    /// Index into the locale list
    site: usize,

    /// Path relative to the locale content root
    path: String,

    /// Markdown source file
    source: PathBuf,

    /// Source comes from the default locale
    fallback: bool,
}

#[derive(Debug, serde::Serialize)]
struct SearchEntry {
    location: String,
    title: String,
    text: String,
    lang: String,
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    markdown: MarkdownOptions,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            markdown: MarkdownOptions::from_config(&config.site),
            templates: TemplateEngine::new(),
            config,
        }
    }

    /// Build the static site.
    ///
    /// The configuration is validated against the docs tree before anything
    /// is written.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let config = &self.config;

        let issues = validate(&config.site, &config.docs_dir);
        if !issues.is_empty() {
            return Err(BuildError::InvalidConfig(issues));
        }
        let default = config
            .site
            .default_locale()
            .ok_or_else(|| BuildError::InvalidConfig(vec![Issue::NoDefaultLocale]))?;

        self.prepare_output()?;

        let (sites, jobs) = self.plan(&default);
        tracing::debug!("Rendering {} pages in {} locales", jobs.len(), sites.len());

        let results: Vec<Result<SearchEntry, BuildError>> = jobs
            .par_iter()
            .map(|job| self.build_page(&sites, job))
            .collect();

        let mut search = Vec::with_capacity(results.len());
        for result in results {
            search.push(result?);
        }

        let assets = self.copy_assets(&sites)?;
        self.generate_assets()?;
        self.generate_search_index(&sites, &search)?;
        self.generate_sitemap(&search)?;

        Ok(BuildResult {
            pages: jobs.len(),
            fallback_pages: jobs.iter().filter(|j| j.fallback).count(),
            assets,
            locales: sites.iter().map(|s| s.locale.code.clone()).collect(),
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: config.site_dir.clone(),
        })
    }

    fn prepare_output(&self) -> Result<(), BuildError> {
        let site_dir = &self.config.site_dir;

        if self.config.clean && site_dir.exists() {
            if self.config.docs_dir.starts_with(site_dir) {
                return Err(BuildError::UnsafeClean(site_dir.clone()));
            }
            fs::remove_dir_all(site_dir).map_err(|source| BuildError::Write {
                path: site_dir.clone(),
                source,
            })?;
            tracing::debug!("Removed {}", site_dir.display());
        }

        fs::create_dir_all(site_dir).map_err(|source| BuildError::Write {
            path: site_dir.clone(),
            source,
        })
    }

    /// Collect the locales to build and their pages.
    fn plan(&self, default: &Locale) -> (Vec<LocaleSite>, Vec<PageJob>) {
        let site = &self.config.site;
        let default_root = self.config.docs_dir.join(&default.content_dir);
        let default_pages = discover_pages(&default_root);

        let mut sites = Vec::new();
        let mut jobs = Vec::new();

        for locale in site.locales().into_iter().filter(|l| l.build || l.default) {
            let index = sites.len();
            let root = self.config.docs_dir.join(&locale.content_dir);
            let own = if locale.default {
                default_pages.clone()
            } else {
                discover_pages(&root)
            };

            let mut pages: BTreeSet<String> = BTreeSet::new();
            for path in own {
                jobs.push(PageJob {
                    site: index,
                    source: root.join(&path),
                    path: path.clone(),
                    fallback: false,
                });
                pages.insert(path);
            }

            if !locale.default && site.fallback_to_default() {
                for path in &default_pages {
                    if pages.insert(path.clone()) {
                        jobs.push(PageJob {
                            site: index,
                            source: default_root.join(path),
                            path: path.clone(),
                            fallback: true,
                        });
                    }
                }
            }

            let prefix = format!("{}{}", self.config.base_url, locale.url_prefix());
            let entries = site.nav_for(&locale);
            let nav = if entries.is_empty() {
                let paths: Vec<String> = pages.iter().cloned().collect();
                navigation::from_pages(&paths, &prefix)
            } else {
                navigation::from_config(entries, &prefix)
            };

            if pages.is_empty() {
                tracing::warn!("Locale '{}' has no pages", locale.code);
            }

            sites.push(LocaleSite {
                locale,
                prefix,
                nav,
                pages,
            });
        }

        (sites, jobs)
    }

    /// Build a single page.
    fn build_page(&self, sites: &[LocaleSite], job: &PageJob) -> Result<SearchEntry, BuildError> {
        let site = &sites[job.site];
        let source = fs::read_to_string(&job.source).map_err(|source| BuildError::Read {
            path: job.source.clone(),
            source,
        })?;

        let url = navigation::page_url(&job.path);
        let is_index = navigation::is_index(&job.path);
        let rendered = if job.fallback {
            let source_url = format!("{}{}", self.config.base_url, url);
            markdown::render_relocated(&source, &self.markdown, is_index, &source_url)
        } else {
            markdown::render(&source, &self.markdown, is_index)
        };
        let full_url = format!("{}{}", site.prefix, url);

        let mut nav = site.nav.clone();
        navigation::mark_active(&mut nav, &full_url);

        let site_name = site
            .locale
            .site_name
            .clone()
            .unwrap_or_else(|| self.config.site.site_name.clone());
        let title = navigation::find_title(&nav, &full_url)
            .map(str::to_string)
            .or_else(|| rendered.title.clone())
            .unwrap_or_else(|| {
                if job.path == "index.md" {
                    site_name.clone()
                } else {
                    navigation::title_from_path(&job.path)
                }
            });

        let context = Context {
            title: title.clone(),
            site_name,
            site_description: self.config.site.site_description.clone(),
            lang: site.locale.code.clone(),
            content: rendered.html.clone(),
            nav,
            toc: rendered.toc,
            base_url: self.config.base_url.clone(),
            home_url: site.prefix.clone(),
            alternates: self.alternates(sites, site, &job.path),
            features: self.config.site.theme.features.clone(),
            extra: self.config.site.extra.clone(),
            fallback: job.fallback,
            live_reload: self.config.live_reload.clone(),
        };

        let html = self
            .templates
            .render_page("page.html", &context)
            .map_err(|source| BuildError::Template {
                page: job.path.clone(),
                source,
            })?;

        let output = self
            .config
            .site_dir
            .join(site.locale.url_prefix())
            .join(navigation::output_file(&job.path));
        write_file(&output, html)?;

        Ok(SearchEntry {
            location: format!("{}{}", site.locale.url_prefix(), url),
            title,
            text: markdown::html_to_text(&rendered.html),
            lang: site.locale.code.clone(),
        })
    }

    /// Locale switcher entries for a page.
    ///
    /// Entries of `extra.alternate` whose `lang` is a built locale link to the
    /// same page in that locale; without `extra.alternate` every built locale
    /// is listed.
    fn alternates(&self, sites: &[LocaleSite], current: &LocaleSite, path: &str) -> Vec<Alternate> {
        let url = navigation::page_url(path);
        let link_for = |code: &str| {
            sites.iter().find(|s| s.locale.code == code).map(|s| {
                if s.pages.contains(path) {
                    format!("{}{}", s.prefix, url)
                } else {
                    s.prefix.clone()
                }
            })
        };

        let configured = self
            .config
            .site
            .extra
            .get("alternate")
            .and_then(Value::as_sequence);

        match configured {
            Some(entries) => entries
                .iter()
                .filter_map(|entry| {
                    let name = entry.get("name")?.as_str()?;
                    let lang = entry.get("lang").and_then(Value::as_str).unwrap_or_default();
                    let link = link_for(lang).or_else(|| {
                        entry
                            .get("link")
                            .and_then(Value::as_str)
                            .map(|link| self.absolute(link))
                    })?;
                    Some(Alternate {
                        name: name.to_string(),
                        link,
                        lang: lang.to_string(),
                        active: lang == current.locale.code,
                    })
                })
                .collect(),
            None => sites
                .iter()
                .map(|s| Alternate {
                    name: s.locale.name.clone(),
                    link: link_for(&s.locale.code).unwrap_or_else(|| s.prefix.clone()),
                    lang: s.locale.code.clone(),
                    active: s.locale.code == current.locale.code,
                })
                .collect(),
        }
    }

    /// Resolve a site-absolute link against the base URL.
    fn absolute(&self, link: &str) -> String {
        match link.strip_prefix('/') {
            Some(rest) => format!("{}{}", self.config.base_url, rest),
            None => link.to_string(),
        }
    }

    /// Copy non-Markdown files from the docs directory.
    ///
    /// Files inside a locale folder land under that locale's URL prefix.
    fn copy_assets(&self, sites: &[LocaleSite]) -> Result<usize, BuildError> {
        let docs_dir = &self.config.docs_dir;
        let locales = self.config.site.locales();
        let mut copied = 0;

        for entry in WalkDir::new(docs_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || path.starts_with(&self.config.site_dir) {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if SKIPPED_EXTENSIONS.contains(&ext) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(docs_dir) else {
                continue;
            };
            let hidden = relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
            if hidden {
                continue;
            }

            let Some(dest) = self.asset_destination(relative, sites, &locales) else {
                continue;
            };
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|source| BuildError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::copy(path, &dest).map_err(|source| BuildError::Write {
                path: dest.clone(),
                source,
            })?;
            copied += 1;
        }

        Ok(copied)
    }

    fn asset_destination(
        &self,
        relative: &Path,
        sites: &[LocaleSite],
        locales: &[Locale],
    ) -> Option<PathBuf> {
        if self.config.site.i18n.is_some() {
            let mut components = relative.components();
            let first = components.next()?.as_os_str().to_string_lossy().into_owned();

            if let Some(site) = sites.iter().find(|s| s.locale.code == first) {
                return Some(
                    self.config
                        .site_dir
                        .join(site.locale.url_prefix())
                        .join(components.as_path()),
                );
            }
            // folder of a locale that is not built
            if locales.iter().any(|l| l.code == first) {
                return None;
            }
        }
        Some(self.config.site_dir.join(relative))
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let assets_dir = self.config.site_dir.join("assets");

        let css = AssetPipeline::generate_css();
        let css = if self.config.minify {
            match AssetPipeline::minify_css(&css) {
                Ok(minified) => minified,
                Err(e) => {
                    tracing::warn!("Failed to minify CSS: {}", e);
                    css
                }
            }
        } else {
            css
        };
        write_file(&assets_dir.join("main.css"), css)?;
        write_file(&assets_dir.join("main.js"), AssetPipeline::generate_js())?;

        Ok(())
    }

    /// Generate search index.
    fn generate_search_index(
        &self,
        sites: &[LocaleSite],
        entries: &[SearchEntry],
    ) -> Result<(), BuildError> {
        let index = serde_json::json!({
            "config": {
                "lang": sites.iter().map(|s| s.locale.code.as_str()).collect::<Vec<_>>(),
                "separator": "[\\s\\-]+",
            },
            "docs": entries,
        });
        let json = serde_json::to_string(&index)?;

        write_file(&self.config.site_dir.join("search-index.json"), json)
    }

    /// Root URL used in the sitemap: `site_url` when set, else the base URL.
    fn site_root(&self) -> String {
        match &self.config.site.site_url {
            Some(url) => format!("{}/", url.trim_end_matches('/')),
            None => self.config.base_url.clone(),
        }
    }

    /// Generate sitemap.
    fn generate_sitemap(&self, entries: &[SearchEntry]) -> Result<(), BuildError> {
        let root = self.site_root();

        let mut locations: Vec<&str> = entries.iter().map(|e| e.location.as_str()).collect();
        locations.sort_unstable();

        let urls: Vec<String> = locations
            .iter()
            .map(|location| {
                format!(
                    "  <url>\n    <loc>{}</loc>\n  </url>",
                    escape_html(&format!("{}{}", root, location))
                )
            })
            .collect();

        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>
"#,
            urls.join("\n")
        );
        write_file(&self.config.site_dir.join("sitemap.xml"), sitemap)?;

        let robots = format!("User-agent: *\nAllow: /\nSitemap: {}sitemap.xml\n", root);
        write_file(&self.config.site_dir.join("robots.txt"), robots)
    }
}

/// Markdown pages under `root`, relative and `/`-separated, sorted.
fn discover_pages(root: &Path) -> Vec<String> {
    if !root.is_dir() {
        return Vec::new();
    }

    let mut pages: Vec<String> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("md"))
        .filter_map(|e| {
            let relative = e.path().strip_prefix(root).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
        .collect();

    pages.sort();
    pages
}

fn write_file(path: &Path, content: String) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const I18N_CONFIG: &str = r#"
site_name: CueMol
site_url: https://example.com/docs/
theme:
  features:
    - navigation.tabs
plugins:
  - search
  - i18n:
      languages:
        - locale: ja
          name: 日本語
          default: true
        - locale: en
          name: English
          site_name: CueMol (en)
markdown_extensions:
  - attr_list
  - tables
  - toc:
      permalink: true
nav:
  - ホーム: index.md
  - Download: Download.md
"#;

    fn write(root: &Path, files: &[(&str, &str)]) {
        for (path, content) in files {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn localized_project(root: &Path) {
        write(
            root,
            &[
                ("docs/ja/index.md", "## ようこそ\n\n[ダウンロード](Download.md)\n"),
                ("docs/ja/Download.md", "## 入手方法\n\n![tube](../assets/images/Download/tube.png){ .on-glb }\n"),
                ("docs/ja/Download.pwtxt", "*入手方法"),
                ("docs/en/index.md", "## Welcome\n"),
                ("docs/en/logo.svg", "<svg/>"),
                ("docs/assets/images/Download/tube.png", "png"),
            ],
        );
    }

    fn builder(root: &Path, yaml: &str) -> StaticBuilder {
        let site = SiteConfig::from_yaml(yaml).unwrap();
        StaticBuilder::new(BuildConfig::new(site, root))
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn builds_localized_site() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());

        let result = builder(temp.path(), I18N_CONFIG).build().unwrap();
        let site = temp.path().join("site");

        assert_eq!(result.pages, 4);
        assert_eq!(result.fallback_pages, 1);
        assert_eq!(result.locales, vec!["ja".to_string(), "en".to_string()]);
        assert!(site.join("index.html").exists());
        assert!(site.join("Download/index.html").exists());
        assert!(site.join("en/index.html").exists());

        let ja_home = read(site.join("index.html"));
        assert!(ja_home.contains("<html lang=\"ja\">"));
        assert!(ja_home.contains("<title>ホーム - CueMol</title>"));
        assert!(ja_home.contains("headerlink"));
        assert!(ja_home.contains(">English</a>"));

        let en_download = read(site.join("en/Download/index.html"));
        assert!(en_download.contains("fallback-notice"));
        assert!(en_download.contains("入手方法"));
        assert!(en_download.contains("CueMol (en)"));
        assert!(en_download.contains("class=\"on-glb\""));
    }

    #[test]
    fn fallback_pages_link_default_locale_images() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());

        builder(temp.path(), I18N_CONFIG).build().unwrap();
        let site = temp.path().join("site");

        let en_download = read(site.join("en/Download/index.html"));
        let src = "/docs/assets/images/Download/tube.png";
        assert!(en_download.contains(&format!("src=\"{}\"", src)));
        assert!(site.join(src.trim_start_matches("/docs/")).exists());

        let ja_download = read(site.join("Download/index.html"));
        assert!(ja_download.contains("src=\"../assets/images/Download/tube.png\""));
    }

    #[test]
    fn skips_locales_not_built() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());
        let yaml = I18N_CONFIG.replace(
            "          site_name: CueMol (en)\n",
            "          site_name: CueMol (en)\n          build: false\n",
        );

        let result = builder(temp.path(), &yaml).build().unwrap();
        let site = temp.path().join("site");

        assert_eq!(result.pages, 2);
        assert_eq!(result.locales, vec!["ja".to_string()]);
        assert!(!site.join("en").exists());

        let ja_home = read(site.join("index.html"));
        assert!(!ja_home.contains("locale-switcher"));
        assert!(!ja_home.contains(">English</a>"));

        let index: serde_json::Value =
            serde_json::from_str(&read(site.join("search-index.json"))).unwrap();
        assert_eq!(index["config"]["lang"], serde_json::json!(["ja"]));
        assert!(index["docs"]
            .as_array()
            .unwrap()
            .iter()
            .all(|d| d["lang"] == "ja"));
    }

    #[test]
    fn rewrites_markdown_links_to_directory_urls() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());

        builder(temp.path(), I18N_CONFIG).build().unwrap();

        let ja_home = read(temp.path().join("site/index.html"));
        assert!(ja_home.contains("<a href=\"Download/\">ダウンロード</a>"));
    }

    #[test]
    fn copies_assets_by_locale() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());

        let result = builder(temp.path(), I18N_CONFIG).build().unwrap();
        let site = temp.path().join("site");

        assert_eq!(result.assets, 2);
        assert!(site.join("assets/images/Download/tube.png").exists());
        assert!(site.join("en/logo.svg").exists());
        assert!(!site.join("Download.pwtxt").exists());
        assert!(site.join("assets/main.css").exists());
        assert!(site.join("assets/main.js").exists());
    }

    #[test]
    fn writes_search_index_and_sitemap() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());

        builder(temp.path(), I18N_CONFIG).build().unwrap();
        let site = temp.path().join("site");

        let index: serde_json::Value =
            serde_json::from_str(&read(site.join("search-index.json"))).unwrap();
        let docs = index["docs"].as_array().unwrap();
        assert_eq!(docs.len(), 4);
        assert!(docs
            .iter()
            .any(|d| d["location"] == "en/" && d["text"] == "Welcome ¶"));

        let sitemap = read(site.join("sitemap.xml"));
        assert!(sitemap.contains("<loc>https://example.com/docs/Download/</loc>"));
        assert!(sitemap.contains("<loc>https://example.com/docs/en/</loc>"));

        let robots = read(site.join("robots.txt"));
        assert!(robots.contains("Sitemap: https://example.com/docs/sitemap.xml"));
    }

    #[test]
    fn rejects_invalid_configuration_before_writing() {
        let temp = tempdir().unwrap();
        localized_project(temp.path());
        let yaml = I18N_CONFIG.replace("  - i18n:\n", "  - i18n:\n      fallback_to_default: false\n");

        let err = builder(temp.path(), &yaml).build().unwrap_err();

        match err {
            BuildError::InvalidConfig(issues) => assert_eq!(
                issues,
                vec![Issue::MissingPage {
                    locale: "en".to_string(),
                    label: "Download".to_string(),
                    path: "Download.md".to_string(),
                }]
            ),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!temp.path().join("site").exists());
    }

    #[test]
    fn derives_navigation_without_i18n() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            &[
                ("docs/index.md", "# Welcome\n"),
                ("docs/Getting_Started.md", "Start here\n"),
                ("docs/manual/Tube.md", "Tube\n"),
            ],
        );

        let result = builder(temp.path(), "site_name: Docs\n").build().unwrap();
        let site = temp.path().join("site");

        assert_eq!(result.pages, 3);
        assert_eq!(result.locales, vec!["en".to_string()]);
        let home = read(site.join("index.html"));
        assert!(home.contains(">Getting Started</a>"));
        assert!(home.contains("<span class=\"nav-section-title\">Manual</span>"));
        assert!(home.contains("<title>Home - Docs</title>"));
        assert!(!home.contains("locale-switcher"));
        assert!(site.join("manual/Tube/index.html").exists());
    }

    #[test]
    fn cleans_output_and_injects_live_reload() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            &[("docs/index.md", "# Home\n"), ("site/stale.html", "old")],
        );

        let site = SiteConfig::from_yaml("site_name: Docs\n").unwrap();
        let mut config = BuildConfig::new(site, temp.path());
        config.clean = true;
        config.live_reload = Some("/__livereload.js".to_string());
        StaticBuilder::new(config).build().unwrap();

        assert!(!temp.path().join("site/stale.html").exists());
        let home = read(temp.path().join("site/index.html"));
        assert!(home.contains("__livereload.js"));
    }

    #[test]
    fn refuses_to_clean_docs_parent() {
        let temp = tempdir().unwrap();
        write(temp.path(), &[("docs/index.md", "# Home\n")]);

        let site = SiteConfig::from_yaml("site_name: Docs\nsite_dir: .\n").unwrap();
        let mut config = BuildConfig::new(site, temp.path());
        config.clean = true;

        let err = StaticBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, BuildError::UnsafeClean(_)));
        assert!(temp.path().join("docs/index.md").exists());
    }
}
