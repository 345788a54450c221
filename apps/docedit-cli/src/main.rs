//! docedit binary
//!
//! JSON goes to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "docedit")]
#[command(version, about = "Inspect text extraction and replay edit scripts")]
struct Args {
    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the editable text items extracted from one page dump
    Extract {
        /// Page JSON: { "width", "height", "runs": [...], "fill"? }
        page: PathBuf,
    },
    /// Load a fixture document, run an edit script, print the final state
    Replay {
        /// Document JSON: { "pages": [...] }
        document: PathBuf,
        /// JSON array of edit commands
        commands: PathBuf,
    },
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = docedit_cli::load_config(args.config.as_deref())?;

    let output = match args.command {
        Command::Extract { page } => {
            let items = docedit_cli::extract_page(&read(&page)?, &config)?;
            tracing::info!(items = items.len(), "extracted {}", page.display());
            serde_json::to_string_pretty(&items)?
        }
        Command::Replay { document, commands } => {
            let report = docedit_cli::replay(&read(&document)?, &read(&commands)?, &config)?;
            serde_json::to_string_pretty(&report)?
        }
    };
    println!("{}", output);
    Ok(())
}
