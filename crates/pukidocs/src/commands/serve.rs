//! Live-reloading preview server command.

use anyhow::{Context, Result};
use pukidocs_config::SiteConfig;
use pukidocs_server::{DevServer, DevServerConfig};

use crate::project::Project;

/// Run the preview server until interrupted.
pub async fn run(project: &Project, dev_addr: Option<String>, open: bool) -> Result<()> {
    let config_path = project.config_path();
    let site = SiteConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let config = DevServerConfig {
        root: project.root.clone(),
        config_path,
        addr: dev_addr.unwrap_or(site.dev_addr),
        open,
    };

    tracing::info!("Starting preview server on {}", config.addr);
    DevServer::new(config).start().await?;

    Ok(())
}
