//! PukiWiki conversion command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use pukidocs_config::skeleton;
use pukidocs_wiki::{ConvertOptions, ConvertReport, SourceEncoding, WikiConverter};

use crate::project::Project;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// PukiWiki data directory (e.g. htdocs)
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Markdown docs directory to write
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Remove previous locale folders and images before converting
    #[arg(long)]
    clean: bool,

    /// Force a source encoding (e.g. euc-jp, shift_jis) instead of detection
    #[arg(long)]
    encoding: Option<String>,

    /// Site name for a newly written mkdocs.yml
    #[arg(long)]
    site_name: Option<String>,

    /// Wiki page rendered as index
    #[arg(long)]
    start_page: Option<String>,

    /// Overwrite mkdocs.yml even if it exists
    #[arg(long)]
    write_config: bool,
}

/// Run the convert command.
pub async fn run(project: &Project, args: ConvertArgs) -> Result<()> {
    let options = resolve_options(project, &args)?;
    let converter = WikiConverter::new(options.clone());

    tracing::info!(
        "Converting {} into {}",
        options.source_dir.display(),
        options.output_dir.display()
    );

    let report = tokio::task::spawn_blocking(move || converter.run()).await??;

    for (locale, pages) in &report.pages {
        tracing::info!("{}: {} pages", locale, pages.len());
    }
    tracing::info!(
        "Converted {} pages, skipped {}, copied {} attachments in {}ms",
        report.page_count(),
        report.skipped,
        report.attachments,
        report.duration_ms
    );

    let config_path = project.config_path();
    if args.write_config || !config_path.exists() {
        write_skeleton(project, &args, &options, &report, &config_path)?;
    } else {
        tracing::debug!("Keeping existing {}", config_path.display());
    }

    if !report.failures.is_empty() {
        anyhow::bail!("{} files failed to convert", report.failures.len());
    }

    Ok(())
}

/// Merge CLI flags over pukidocs.toml.
fn resolve_options(project: &Project, args: &ConvertArgs) -> Result<ConvertOptions> {
    let settings = &project.settings.convert;

    let source_dir = args
        .source_dir
        .clone()
        .or_else(|| settings.source_dir.as_deref().map(|p| project.resolve(p)))
        .context("No source directory: pass --source-dir or set convert.source_dir")?;
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| settings.output_dir.as_deref().map(|p| project.resolve(p)))
        .context("No output directory: pass --output-dir or set convert.output_dir")?;

    let encoding = match args.encoding.as_ref().or(settings.encoding.as_ref()) {
        Some(label) => SourceEncoding::from_label(label)
            .with_context(|| format!("Unknown encoding: {}", label))?,
        None => SourceEncoding::Auto,
    };

    Ok(ConvertOptions {
        source_dir,
        output_dir,
        default_locale: settings.default_locale.clone(),
        locales: settings.locale_sources(),
        attach_dir: settings.attach_dir(),
        images_dir: settings.images_dir.clone(),
        start_page: args
            .start_page
            .clone()
            .unwrap_or_else(|| settings.start_page.clone()),
        skip_pages: settings.skip_pages.clone(),
        encoding,
        keep_source: settings.keep_source,
        clean: args.clean,
    })
}

fn write_skeleton(
    project: &Project,
    args: &ConvertArgs,
    options: &ConvertOptions,
    report: &ConvertReport,
    config_path: &Path,
) -> Result<()> {
    let site_name = args
        .site_name
        .clone()
        .or_else(|| project.settings.convert.site_name.clone())
        .or_else(|| {
            project
                .root
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "Documentation".to_string());

    let locales: Vec<String> = options.locales.iter().map(|l| l.code.clone()).collect();
    let pages = report
        .pages
        .get(&options.default_locale)
        .cloned()
        .unwrap_or_default();

    let site = skeleton(
        &site_name,
        docs_dir_for(&project.root, &options.output_dir),
        &options.default_locale,
        &locales,
        &pages,
    );
    site.save(config_path)?;
    tracing::info!("Wrote {}", config_path.display());

    Ok(())
}

/// Output directory as written into mkdocs.yml, relative to the project when
/// it lies inside it.
fn docs_dir_for(root: &Path, output_dir: &Path) -> PathBuf {
    match (root.canonicalize(), output_dir.canonicalize()) {
        (Ok(root), Ok(output)) => match output.strip_prefix(&root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => output,
        },
        _ => output_dir.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::SETTINGS_FILENAME;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn args() -> ConvertArgs {
        ConvertArgs {
            source_dir: None,
            output_dir: None,
            clean: false,
            encoding: None,
            site_name: None,
            start_page: None,
            write_config: false,
        }
    }

    #[test]
    fn flags_override_settings() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SETTINGS_FILENAME),
            "[convert]\nsource_dir = \"htdocs\"\noutput_dir = \"docs\"\nstart_page = \"Top\"\n",
        )
        .unwrap();
        let project = Project::open(Some(temp.path())).unwrap();

        let options = resolve_options(&project, &args()).unwrap();
        assert_eq!(options.source_dir, temp.path().join("htdocs"));
        assert_eq!(options.output_dir, temp.path().join("docs"));
        assert_eq!(options.start_page, "Top");

        let overridden = ConvertArgs {
            output_dir: Some(PathBuf::from("out")),
            start_page: Some("FrontPage".to_string()),
            clean: true,
            ..args()
        };
        let options = resolve_options(&project, &overridden).unwrap();
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert_eq!(options.start_page, "FrontPage");
        assert!(options.clean);
    }

    #[test]
    fn requires_source_dir() {
        let temp = TempDir::new().unwrap();
        let project = Project::open(Some(temp.path())).unwrap();

        let err = resolve_options(&project, &args()).unwrap_err();
        assert!(err.to_string().contains("--source-dir"));
    }

    #[test]
    fn rejects_unknown_encoding() {
        let temp = TempDir::new().unwrap();
        let project = Project::open(Some(temp.path())).unwrap();

        let with_encoding = ConvertArgs {
            source_dir: Some(PathBuf::from("htdocs")),
            output_dir: Some(PathBuf::from("docs")),
            encoding: Some("klingon".to_string()),
            ..args()
        };
        assert!(resolve_options(&project, &with_encoding).is_err());
    }

    #[test]
    fn docs_dir_is_relative_inside_project() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();

        assert_eq!(
            docs_dir_for(temp.path(), &temp.path().join("docs")),
            PathBuf::from("docs")
        );
    }

    #[tokio::test]
    async fn converts_and_writes_config() {
        let temp = TempDir::new().unwrap();
        let wiki = temp.path().join("htdocs/ja/wiki");
        fs::create_dir_all(&wiki).unwrap();
        // FrontPage, Guide
        fs::write(wiki.join("46726F6E7450616765.txt"), "* Welcome\n").unwrap();
        fs::write(wiki.join("4775696465.txt"), "* Guide\n").unwrap();

        let project = Project::open(Some(temp.path())).unwrap();
        let convert = ConvertArgs {
            source_dir: Some(temp.path().join("htdocs")),
            output_dir: Some(temp.path().join("docs")),
            site_name: Some("Wiki".to_string()),
            ..args()
        };
        run(&project, convert).await.unwrap();

        assert!(temp.path().join("docs/ja/index.md").exists());
        assert!(temp.path().join("docs/ja/Guide.md").exists());

        let config = pukidocs_config::SiteConfig::load(&project.config_path()).unwrap();
        assert_eq!(config.site_name, "Wiki");
        assert_eq!(config.docs_dir, PathBuf::from("docs"));
    }

    #[tokio::test]
    async fn page_failures_fail_the_command() {
        let temp = TempDir::new().unwrap();
        let wiki = temp.path().join("htdocs/ja/wiki");
        fs::create_dir_all(&wiki).unwrap();
        // FrontPage
        fs::write(wiki.join("46726F6E7450616765.txt"), "* Welcome\n").unwrap();
        fs::write(wiki.join("zz.txt"), "broken\n").unwrap();

        let project = Project::open(Some(temp.path())).unwrap();
        let convert = ConvertArgs {
            source_dir: Some(temp.path().join("htdocs")),
            output_dir: Some(temp.path().join("docs")),
            ..args()
        };
        let err = run(&project, convert).await.unwrap_err();

        assert!(err.to_string().contains("1 files failed"));
        assert!(temp.path().join("docs/ja/index.md").exists());
        assert!(project.config_path().exists());
    }
}
