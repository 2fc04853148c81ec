//! Catalog Sync CLI
//!
//! A command-line tool that fills a local movie catalog from TMDB.

use catalog_sync::cli::{
    args::{Cli, Commands},
    commands::{genres, reset, stats, sync},
};
use catalog_sync::models::config::{load_config, Config};
use catalog_sync::preflight;
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    // Run the appropriate command
    match cli.command {
        Commands::Sync {
            target,
            sort_by,
            concurrency,
            min_votes,
            released_within_months,
            store,
            report,
            skip_genres,
        } => {
            if !cli.skip_preflight {
                let store_path = store.as_deref().unwrap_or(config.store_path.as_path());
                run_preflight_checks(&config, Some(store_path)).await?;
            }

            let args = sync::SyncArgs {
                target,
                sort_by,
                concurrency,
                min_votes,
                released_within_months,
                store,
                report,
                skip_genres,
            };

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, finishing the current movies...");
                    on_ctrl_c.cancel();
                }
            });

            sync::sync(&config, &args, cancel).await?;
        }

        Commands::Genres { store } => {
            if !cli.skip_preflight {
                let store_path = store.as_deref().unwrap_or(config.store_path.as_path());
                run_preflight_checks(&config, Some(store_path)).await?;
            }
            genres::genres(&config, store.as_deref()).await?;
        }

        Commands::Stats { store } => {
            stats::stats(&config, store.as_deref()).await?;
        }

        Commands::Reset { store, confirm } => {
            reset::reset(&config, store.as_deref(), confirm).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("catalog_sync=debug")
    } else {
        EnvFilter::new("catalog_sync=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and exit if any fail.
async fn run_preflight_checks(config: &Config, store: Option<&Path>) -> anyhow::Result<()> {
    use colored::Colorize;

    println!("{}", "Running preflight checks...".bold());
    println!();

    let results = preflight::run_preflight_checks(config, store).await?;
    preflight::print_results(&results);

    println!();

    if !preflight::all_passed(&results) {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
