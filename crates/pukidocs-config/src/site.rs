//! Site configuration model and loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::nav::NavEntry;

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "mkdocs.yml";

/// Name of the localization plugin.
const I18N_PLUGIN: &str = "i18n";

/// Errors that can occur when loading a site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
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

    #[error("Invalid YAML in site configuration: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("Invalid options for plugin '{plugin}': {message}")]
    PluginOptions { plugin: String, message: String },
}

/// A plugin or markdown extension entry: a bare name or `{name: options}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct NamedEntry {
    pub name: String,
    pub options: Value,
}

impl NamedEntry {
    /// An entry without options.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Value::Null,
        }
    }

    /// An entry with options.
    pub fn with_options(name: impl Into<String>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Look up a boolean option.
    pub fn bool_option(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }
}

impl TryFrom<Value> for NamedEntry {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(Self::bare(name)),
            Value::Mapping(map) if map.len() == 1 => {
                let Some((key, options)) = map.into_iter().next() else {
                    return Err("empty entry".to_string());
                };
                let name = key
                    .as_str()
                    .ok_or_else(|| format!("entry name must be a string: {:?}", key))?
                    .to_string();
                Ok(Self::with_options(name, options))
            }
            other => Err(format!("expected a name or a single-key mapping: {:?}", other)),
        }
    }
}

impl From<NamedEntry> for Value {
    fn from(entry: NamedEntry) -> Self {
        if entry.options.is_null() {
            Value::String(entry.name)
        } else {
            let mut map = Mapping::new();
            map.insert(Value::String(entry.name), entry.options);
            Value::Mapping(map)
        }
    }
}

/// Theme settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_theme_name")]
    pub name: String,

    /// Site language when no localization plugin is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Feature toggles, e.g. `navigation.tabs`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: default_theme_name(),
            language: None,
            features: Vec::new(),
        }
    }
}

impl ThemeConfig {
    /// Whether a feature toggle is enabled.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// One language of the `i18n` plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub locale: String,

    /// Display name for the locale switcher
    pub name: String,

    #[serde(default)]
    pub default: bool,

    #[serde(default = "default_true")]
    pub build: bool,

    /// Localized site name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    /// Localized navigation override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav: Option<Vec<NavEntry>>,
}

/// Options of the `i18n` plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct I18nOptions {
    #[serde(default = "default_docs_structure")]
    pub docs_structure: String,

    /// Render the default locale's page when a locale lacks one
    #[serde(default = "default_true")]
    pub fallback_to_default: bool,

    #[serde(default)]
    pub languages: Vec<LanguageConfig>,
}

/// Site configuration (`mkdocs.yml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_author: Option<String>,

    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,

    #[serde(default = "default_dev_addr")]
    pub dev_addr: String,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub plugins: Vec<NamedEntry>,

    #[serde(default)]
    pub markdown_extensions: Vec<NamedEntry>,

    /// Free-form data for templates
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub extra: Mapping,

    #[serde(default)]
    pub nav: Vec<NavEntry>,

    /// Resolved `i18n` plugin options (set after loading).
    #[serde(skip)]
    pub i18n: Option<I18nOptions>,
}

fn default_theme_name() -> String {
    "material".to_string()
}
fn default_docs_structure() -> String {
    "folder".to_string()
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}
fn default_site_dir() -> PathBuf {
    PathBuf::from("site")
}
fn default_dev_addr() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_true() -> bool {
    true
}

/// A resolved locale of the site.
#[derive(Debug, Clone, PartialEq)]
pub struct Locale {
    pub code: String,
    pub name: String,
    pub default: bool,
    pub build: bool,
    pub site_name: Option<String>,
    pub nav: Option<Vec<NavEntry>>,

    /// Content folder relative to `docs_dir` (empty without i18n)
    pub content_dir: PathBuf,
}

impl Locale {
    /// URL prefix relative to the site root: empty for the default locale,
    /// `<code>/` otherwise.
    pub fn url_prefix(&self) -> String {
        if self.default {
            String::new()
        } else {
            format!("{}/", self.code)
        }
    }
}

impl SiteConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!("Loaded site configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: SiteConfig = serde_yaml::from_str(content)?;
        config.resolve_plugins()?;
        Ok(config)
    }

    /// Serialize the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        let mut config = self.clone();
        if let Some(i18n) = &self.i18n {
            let options =
                serde_yaml::to_value(i18n).map_err(ConfigError::InvalidYaml)?;
            match config.plugins.iter_mut().find(|p| p.name == I18N_PLUGIN) {
                Some(plugin) => plugin.options = options,
                None => config
                    .plugins
                    .push(NamedEntry::with_options(I18N_PLUGIN, options)),
            }
        }
        Ok(serde_yaml::to_string(&config)?)
    }

    /// Write the configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn resolve_plugins(&mut self) -> Result<(), ConfigError> {
        self.i18n = match self.plugins.iter().find(|p| p.name == I18N_PLUGIN) {
            Some(plugin) => {
                let options = if plugin.options.is_null() {
                    Value::Mapping(Mapping::new())
                } else {
                    plugin.options.clone()
                };
                let parsed: I18nOptions =
                    serde_yaml::from_value(options).map_err(|e| ConfigError::PluginOptions {
                        plugin: I18N_PLUGIN.to_string(),
                        message: e.to_string(),
                    })?;
                Some(parsed)
            }
            None => None,
        };
        Ok(())
    }

    /// Whether a markdown extension is enabled.
    pub fn extension(&self, name: &str) -> Option<&NamedEntry> {
        self.markdown_extensions.iter().find(|e| e.name == name)
    }

    /// Whether pages missing from a locale fall back to the default locale.
    pub fn fallback_to_default(&self) -> bool {
        self.i18n.as_ref().map_or(true, |i| i.fallback_to_default)
    }

    /// All locales of the site.
    ///
    /// Without the `i18n` plugin there is one implicit default locale whose
    /// content root is `docs_dir` itself.
    pub fn locales(&self) -> Vec<Locale> {
        match &self.i18n {
            Some(i18n) => i18n
                .languages
                .iter()
                .map(|lang| Locale {
                    code: lang.locale.clone(),
                    name: lang.name.clone(),
                    default: lang.default,
                    build: lang.build,
                    site_name: lang.site_name.clone(),
                    nav: lang.nav.clone(),
                    content_dir: PathBuf::from(&lang.locale),
                })
                .collect(),
            None => {
                let code = self.theme.language.clone().unwrap_or_else(|| "en".to_string());
                vec![Locale {
                    name: code.clone(),
                    code,
                    default: true,
                    build: true,
                    site_name: None,
                    nav: None,
                    content_dir: PathBuf::new(),
                }]
            }
        }
    }

    /// The default locale, if exactly one is marked default.
    pub fn default_locale(&self) -> Option<Locale> {
        let mut defaults = self.locales().into_iter().filter(|l| l.default);
        let first = defaults.next()?;
        match defaults.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// Navigation tree for a locale: its override or the default tree.
    pub fn nav_for<'a>(&'a self, locale: &'a Locale) -> &'a [NavEntry] {
        locale.nav.as_deref().unwrap_or(&self.nav)
    }

    /// Base path of the site derived from `site_url`, always ending in `/`.
    pub fn base_path(&self) -> String {
        let Some(url) = &self.site_url else {
            return "/".to_string();
        };
        let after_scheme = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
        let path = after_scheme.find('/').map_or("", |pos| &after_scheme[pos..]);
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
site_name: CueMol
site_url: https://www.cuemol.org/docs/
theme:
  name: material
  features:
    - navigation.tabs
plugins:
  - search
  - i18n:
      docs_structure: folder
      languages:
        - locale: ja
          name: 日本語
          default: true
          build: true
        - locale: en
          name: English
          build: true
          nav:
            - Home: index.md
markdown_extensions:
  - attr_list
  - toc:
      permalink: true
extra:
  alternate:
    - name: 日本語
      link: /
      lang: ja
nav:
  - ホーム: index.md
  - Download: Download.md
"#;

    #[test]
    fn parses_full_configuration() {
        let config = SiteConfig::from_yaml(CONFIG).unwrap();

        assert_eq!(config.site_name, "CueMol");
        assert_eq!(config.docs_dir, PathBuf::from("docs"));
        assert_eq!(config.dev_addr, "127.0.0.1:8000");
        assert!(config.theme.has_feature("navigation.tabs"));
        assert_eq!(config.plugins.len(), 2);
        assert_eq!(config.nav.len(), 2);
        assert_eq!(config.extension("toc").unwrap().bool_option("permalink"), Some(true));
        assert!(config.extra.contains_key("alternate"));

        let i18n = config.i18n.as_ref().unwrap();
        assert!(i18n.fallback_to_default);
        assert_eq!(i18n.languages.len(), 2);
    }

    #[test]
    fn resolves_locales() {
        let config = SiteConfig::from_yaml(CONFIG).unwrap();
        let locales = config.locales();

        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0].url_prefix(), "");
        assert_eq!(locales[1].url_prefix(), "en/");
        assert_eq!(locales[1].content_dir, PathBuf::from("en"));
        assert_eq!(config.default_locale().unwrap().code, "ja");

        assert_eq!(config.nav_for(&locales[0]).len(), 2);
        assert_eq!(config.nav_for(&locales[1]).len(), 1);
    }

    #[test]
    fn single_locale_without_i18n() {
        let config = SiteConfig::from_yaml("site_name: Docs\ntheme:\n  language: ja\n").unwrap();
        let locales = config.locales();

        assert_eq!(locales.len(), 1);
        assert_eq!(locales[0].code, "ja");
        assert!(locales[0].default);
        assert_eq!(locales[0].content_dir, PathBuf::new());
    }

    #[test]
    fn computes_base_path() {
        let mut config = SiteConfig::from_yaml("site_name: Docs").unwrap();
        assert_eq!(config.base_path(), "/");

        config.site_url = Some("https://example.com/docs".to_string());
        assert_eq!(config.base_path(), "/docs/");

        config.site_url = Some("https://example.com/".to_string());
        assert_eq!(config.base_path(), "/");
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = SiteConfig::from_yaml(CONFIG).unwrap();
        let yaml = config.to_yaml().unwrap();
        let reparsed = SiteConfig::from_yaml(&yaml).unwrap();

        assert_eq!(reparsed.locales(), config.locales());
        assert_eq!(reparsed.nav, config.nav);
    }

    #[test]
    fn rejects_bad_plugin_options() {
        let yaml = "site_name: Docs\nplugins:\n  - i18n:\n      languages: 3\n";
        assert!(matches!(
            SiteConfig::from_yaml(yaml),
            Err(ConfigError::PluginOptions { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, CONFIG).unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.site_name, "CueMol");

        let missing = SiteConfig::load(&temp.path().join("nope.yml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
