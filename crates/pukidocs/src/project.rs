//! Project discovery and tool settings (`pukidocs.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use pukidocs_config::CONFIG_FILENAME;
use pukidocs_wiki::{ConvertOptions, LocaleSource};

/// Tool settings file name.
pub const SETTINGS_FILENAME: &str = "pukidocs.toml";

/// Settings file structure (pukidocs.toml).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub convert: ConvertSettings,
    pub build: BuildSettings,
}

/// `[convert]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub site_name: Option<String>,
    pub default_locale: String,
    pub locales: Vec<LocaleSettings>,
    /// An empty path disables attachment copying
    pub attach_dir: PathBuf,
    pub images_dir: String,
    pub start_page: String,
    pub skip_pages: Vec<String>,
    pub encoding: Option<String>,
    pub keep_source: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocaleSettings {
    pub code: String,
    pub wiki_dir: PathBuf,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        let defaults = ConvertOptions::default();
        Self {
            source_dir: None,
            output_dir: None,
            site_name: None,
            default_locale: defaults.default_locale,
            locales: defaults
                .locales
                .into_iter()
                .map(|l| LocaleSettings {
                    code: l.code,
                    wiki_dir: l.wiki_dir,
                })
                .collect(),
            attach_dir: defaults.attach_dir.unwrap_or_default(),
            images_dir: defaults.images_dir,
            start_page: defaults.start_page,
            skip_pages: defaults.skip_pages,
            encoding: None,
            keep_source: defaults.keep_source,
        }
    }
}

impl ConvertSettings {
    /// Locale list in converter form.
    pub fn locale_sources(&self) -> Vec<LocaleSource> {
        self.locales
            .iter()
            .map(|l| LocaleSource::new(l.code.clone(), l.wiki_dir.clone()))
            .collect()
    }

    pub fn attach_dir(&self) -> Option<PathBuf> {
        if self.attach_dir.as_os_str().is_empty() {
            None
        } else {
            Some(self.attach_dir.clone())
        }
    }
}

/// `[build]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub minify: bool,
    /// Site configuration, relative to the project root
    pub config: PathBuf,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: true,
            config: PathBuf::from(CONFIG_FILENAME),
        }
    }
}

/// A project root and its settings.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub settings: ProjectSettings,
}

impl Project {
    /// Locate the project and load its settings.
    ///
    /// With an explicit directory that directory is the root. Otherwise the
    /// nearest ancestor of the working directory holding `pukidocs.toml` or
    /// `mkdocs.yml` is used, falling back to the working directory itself so
    /// `convert` can start a new project.
    pub fn open(explicit: Option<&Path>) -> Result<Self> {
        let root = match explicit {
            Some(dir) => {
                if !dir.is_dir() {
                    anyhow::bail!("Project directory not found: {}", dir.display());
                }
                dir.to_path_buf()
            }
            None => {
                let cwd = std::env::current_dir().context("Failed to read working directory")?;
                match discover(&cwd) {
                    Some(root) => root,
                    None => {
                        tracing::debug!(
                            "No {} or {} found, using {}",
                            SETTINGS_FILENAME,
                            CONFIG_FILENAME,
                            cwd.display()
                        );
                        cwd
                    }
                }
            }
        };

        let settings = load_settings(&root)?;
        Ok(Self { root, settings })
    }

    /// Path to the site configuration.
    pub fn config_path(&self) -> PathBuf {
        self.resolve(&self.settings.build.config)
    }

    /// Resolve a settings path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Find the nearest ancestor containing a project marker file.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(SETTINGS_FILENAME).is_file() || dir.join(CONFIG_FILENAME).is_file())
        .map(Path::to_path_buf)
}

/// Load pukidocs.toml from the root if it exists.
/// Returns an error if the file exists but is malformed.
fn load_settings(root: &Path) -> Result<ProjectSettings> {
    let path = root.join(SETTINGS_FILENAME);
    if !path.exists() {
        return Ok(ProjectSettings::default());
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let settings: ProjectSettings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded settings from {}", path.display());

    Ok(settings)
}
