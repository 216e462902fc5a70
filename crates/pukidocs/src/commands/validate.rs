//! Configuration check command.

use anyhow::{Context, Result};
use pukidocs_config::{validate, SiteConfig};

use crate::project::Project;

/// Run the validate command.
pub fn run(project: &Project) -> Result<()> {
    let config_path = project.config_path();
    let site = SiteConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let docs_dir = project.resolve(&site.docs_dir);

    let issues = validate(&site, &docs_dir);
    if issues.is_empty() {
        let locales: Vec<String> = site.locales().into_iter().map(|l| l.code).collect();
        tracing::info!(
            "{} is valid ({} locales: {})",
            config_path.display(),
            locales.len(),
            locales.join(", ")
        );
        return Ok(());
    }

    for issue in &issues {
        println!("{}", issue);
    }
    anyhow::bail!("{} issues found in {}", issues.len(), config_path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project_with(config: &str) -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/index.md"), "# Home\n").unwrap();
        fs::write(temp.path().join("mkdocs.yml"), config).unwrap();
        let project = Project::open(Some(temp.path())).unwrap();
        (temp, project)
    }

    #[test]
    fn accepts_valid_config() {
        let (_temp, project) = project_with("site_name: Test\nnav:\n  - Home: index.md\n");
        assert!(run(&project).is_ok());
    }

    #[test]
    fn reports_issue_count() {
        let (_temp, project) =
            project_with("site_name: Test\nnav:\n  - Home: index.md\n  - Gone: gone.md\n");

        let err = run(&project).unwrap_err();
        assert!(err.to_string().starts_with("1 issues found"));
    }
}
