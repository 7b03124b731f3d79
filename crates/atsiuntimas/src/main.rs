//! Atsiuntimas - fetch a monthly work schedule and save it as JSON.
//!
//! Runs the same retrieval cascade as the viewer and writes the validated
//! document to disk, by default as the file the viewer's local source reads.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use atsiuntimas::{HttpFetcher, Retriever, Settings};

#[derive(Parser)]
#[command(name = "atsiuntimas")]
#[command(about = "Fetch a monthly work schedule from a URL or cloud share link")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, validate and save a schedule document
    Fetch {
        /// Source: direct JSON URL, Google Drive or OneDrive share link
        #[arg(long)]
        url: String,

        /// Output file
        /// Default: grafikas_data.json in GRAFIKAS_LOCAL_DIR
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Timeout of a single attempt in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Only validate, don't write the file
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            url,
            output,
            timeout,
            dry_run,
        } => {
            fetch_command(&url, output, timeout, dry_run).await?;
        }
    }

    Ok(())
}

async fn fetch_command(
    url: &str,
    output: Option<PathBuf>,
    timeout: Option<u64>,
    dry_run: bool,
) -> Result<()> {
    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(secs) = timeout {
        settings.timeout = Duration::from_secs(secs.max(1));
    }

    let retriever = Retriever::new(
        HttpFetcher::new(settings.timeout),
        settings.relays.clone(),
        settings.local_dir.clone(),
    );
    let output_path = output.unwrap_or_else(|| retriever.local_path());

    let dataset = match retriever.resolve_and_fetch(url).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(kind = e.kind(), "Fetch failed: {}", e);
            return Err(e.into());
        }
    };

    info!(
        title = %dataset.title(),
        teachers = dataset.teachers.len(),
        "Schedule is valid"
    );

    if dry_run {
        info!("Dry run mode - not writing output");
        return Ok(());
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let json = serde_json::to_string_pretty(&dataset)?;
    std::fs::write(&output_path, json).context("Failed to write schedule file")?;

    info!("Schedule saved to: {:?}", output_path);
    Ok(())
}
