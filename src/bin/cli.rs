//! Listing Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use listing_crawler::{
    error::Result,
    models::Config,
    pipeline,
    services::FetchSession,
    storage::{CsvStore, MemoryStore},
};

/// Real-estate listing crawler
#[derive(Parser, Debug)]
#[command(
    name = "listing-crawler",
    version,
    about = "Crawls state and city listing indexes into a deduplicated CSV"
)]
struct Cli {
    /// Path to storage directory containing config.toml and the output file
    #[arg(short, long, default_value = "data")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl listings of the configured states
    Crawl {
        /// Only crawl the state with this name
        #[arg(long)]
        state: Option<String>,

        /// Output file (default: {storage_dir}/{output.file})
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report what would be new without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and selectors
    Validate,

    /// Show output file info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    let output_path = cli.storage_dir.join(&config.output.file);

    match cli.command {
        Command::Crawl {
            state,
            output,
            dry_run,
        } => {
            if let Some(name) = state {
                config.retain_state(&name)?;
            }
            config.validate()?;
            let output_path = output.unwrap_or(output_path);

            // Session closes (and logs) on every exit path
            let session = FetchSession::open(&config.crawler)?;
            let summary = if dry_run {
                let (_, progress) = CsvStore::load(&output_path)?;
                let mut store = MemoryStore::with_progress(progress);
                let summary = pipeline::run_crawler(&config, &session, &mut store).await?;
                log::info!(
                    "Dry run: {} new listings would be written to {}",
                    store.records().len(),
                    output_path.display()
                );
                summary
            } else {
                let mut store = CsvStore::open(&output_path)?;
                pipeline::run_crawler(&config, &session, &mut store).await?
            };
            drop(session);

            log::info!(
                "Crawl complete: {} new listings ({} requests skipped as known)",
                summary.accepted,
                summary.already_known
            );
        }

        Command::Validate => {
            log::info!("Validating {}...", config_path.display());
            if let Err(e) = pipeline::run_validate(&config) {
                log::error!("Validation failed: {}", e);
                return Err(e);
            }
            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!(
                "Config: {}",
                if config_path.exists() {
                    "found"
                } else {
                    "not found (using defaults)"
                }
            );
            if output_path.exists() {
                let (rows, progress) = CsvStore::load(&output_path)?;
                log::info!("Output: {}", output_path.display());
                log::info!("  {} rows, {} known URLs", rows.len(), progress.len());
            } else {
                log::info!("No output at {} yet.", output_path.display());
            }
        }
    }

    Ok(())
}
