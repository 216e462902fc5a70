//! Static site build command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use pukidocs_config::SiteConfig;
use pukidocs_static::{BuildConfig, StaticBuilder};

use crate::project::Project;

/// Run the build command.
pub async fn run(
    project: &Project,
    site_dir: Option<PathBuf>,
    clean: bool,
    minify: Option<bool>,
) -> Result<()> {
    tracing::info!("Building static site...");

    let config_path = project.config_path();
    let site = SiteConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let mut config = BuildConfig::new(site, &project.root);
    if let Some(dir) = site_dir {
        config.site_dir = dir;
    }
    config.clean = clean;
    config.minify = minify.unwrap_or(project.settings.build.minify);

    let builder = StaticBuilder::new(config);
    let result = tokio::task::spawn_blocking(move || builder.build()).await??;

    tracing::info!(
        "Built {} pages ({} fallback) and {} assets for {} in {}ms",
        result.pages,
        result.fallback_pages,
        result.assets,
        result.locales.join(", "),
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn builds_into_overridden_site_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("mkdocs.yml"), "site_name: Test\n").unwrap();
        fs::write(temp.path().join("docs/index.md"), "# Home\n").unwrap();

        let project = Project::open(Some(temp.path())).unwrap();
        let out = temp.path().join("public");
        run(&project, Some(out.clone()), false, Some(false))
            .await
            .unwrap();

        assert!(out.join("index.html").exists());
        assert!(out.join("search-index.json").exists());
        assert!(!temp.path().join("site").exists());
    }

    #[tokio::test]
    async fn fails_without_config() {
        let temp = TempDir::new().unwrap();
        let project = Project::open(Some(temp.path())).unwrap();

        let err = run(&project, None, false, None).await.unwrap_err();
        assert!(err.to_string().contains("mkdocs.yml"));
    }
}
