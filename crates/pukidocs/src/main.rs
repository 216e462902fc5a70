//! pukidocs CLI - PukiWiki to Markdown converter and documentation site generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod project;

use commands::convert::ConvertArgs;
use project::Project;

#[derive(Parser)]
#[command(name = "pukidocs")]
#[command(about = "PukiWiki to Markdown converter and documentation site generator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to the nearest directory with pukidocs.toml or mkdocs.yml)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PukiWiki data directory into Markdown
    Convert(ConvertArgs),

    /// Serve the site with live reload
    Serve {
        /// Address to listen on (defaults to dev_addr in mkdocs.yml)
        #[arg(short = 'a', long)]
        dev_addr: Option<String>,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },

    /// Build the static site
    Build {
        /// Output directory (defaults to site_dir in mkdocs.yml)
        #[arg(short = 'd', long)]
        site_dir: Option<PathBuf>,

        /// Remove the output directory first
        #[arg(long)]
        clean: bool,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Check the site configuration against the docs tree
    Validate,

    /// Decode hex-encoded page names in lines read from stdin
    DecodeNames,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // decode-names is a plain filter and needs no project
    if let Commands::DecodeNames = cli.command {
        return commands::decode_names::run();
    }

    let project = Project::open(cli.project.as_deref())?;

    match cli.command {
        Commands::Convert(args) => {
            commands::convert::run(&project, args).await?;
        }
        Commands::Serve { dev_addr, open } => {
            commands::serve::run(&project, dev_addr, open).await?;
        }
        Commands::Build {
            site_dir,
            clean,
            no_minify,
        } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&project, site_dir, clean, minify).await?;
        }
        Commands::Validate => {
            commands::validate::run(&project)?;
        }
        Commands::DecodeNames => {}
    }

    Ok(())
}
