//! Sync command implementation.

use super::open_store;
use crate::core::ingest::{save_report, Orchestrator, StopReason, SyncOptions, SyncReport};
use crate::models::config::{Config, SortBy};
use crate::services::rate_limit::Pacing;
use crate::services::tmdb::TmdbClient;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Command line overrides for a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub target: Option<usize>,
    pub sort_by: Option<SortBy>,
    pub concurrency: Option<usize>,
    pub min_votes: Option<u32>,
    pub released_within_months: Option<u32>,
    pub store: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub skip_genres: bool,
}

impl SyncArgs {
    /// Layer the overrides on top of the configured sync settings.
    pub fn options(&self, config: &Config) -> SyncOptions {
        let mut sync = config.sync.clone();
        if let Some(target) = self.target {
            sync.target = target;
        }
        if let Some(sort_by) = self.sort_by {
            sync.sort_by = sort_by;
        }
        if let Some(concurrency) = self.concurrency {
            sync.concurrency = concurrency;
        }
        if self.min_votes.is_some() {
            sync.min_vote_count = self.min_votes;
        }
        if self.released_within_months.is_some() {
            sync.released_within_months = self.released_within_months;
        }

        let mut options = SyncOptions::from_config(&sync);
        options.seed_genres = !self.skip_genres;
        options
    }
}

/// Import new movies from TMDB into the catalog store.
pub async fn sync(
    config: &Config,
    args: &SyncArgs,
    cancel: CancellationToken,
) -> Result<SyncReport> {
    println!("{}", "[SYNC] Importing movies from TMDB...".bold().cyan());
    println!();

    let options = args.options(config);
    let client = TmdbClient::from_config(config)?;
    let pacing = Pacing::from_config(&config.rate_limit);
    let source = pacing.wrap(Arc::new(client), &cancel);
    let store = Arc::new(open_store(config, args.store.as_deref()).await?);
    let before = store.stats().await?;

    println!("  {} {}", "Store:".bold(), store.path().display());
    println!("  {} {}", "Target:".bold(), options.target);
    println!("  {} {}", "Sort:".bold(), options.query.sort_by);
    println!("  {} {}", "Movies already stored:".bold(), before.movies);
    println!();

    let orchestrator = Orchestrator::new(source, store.clone(), pacing.per_item, options)
    .with_cancellation(cancel)
    .with_progress(true);

    let report = orchestrator.run().await?;
    print_report(&report);

    let after = store.stats().await?;
    println!("  {} {}", "Movies in catalog:".bold(), after.movies);
    println!("  {} {}", "Directors in catalog:".bold(), after.directors);
    println!("  {} {}", "Actors in catalog:".bold(), after.actors);

    if let Some(ref path) = args.report {
        save_report(&report, path)?;
        println!();
        println!("[INFO] Report saved: {}", path.display());
    }

    Ok(report)
}

fn print_report(report: &SyncReport) {
    println!();
    let header = format!("[Summary] {}", report.stop_reason);
    match report.stop_reason {
        StopReason::TargetReached | StopReason::Exhausted => {
            println!("{}", header.bold().green())
        }
        _ => println!("{}", header.bold().yellow()),
    }
    println!(
        "  {} {}/{}",
        "Created:".bold(),
        report.created.len(),
        report.target
    );
    println!("  {} {}", "Skipped (existing):".bold(), report.skipped);
    println!("  {} {}", "Failed:".bold(), report.failed.len());
    println!("  {} {}", "Pages fetched:".bold(), report.pages_fetched);
    if report.page_errors > 0 {
        println!("  {} {}", "Page errors:".bold(), report.page_errors);
    }

    if !report.failed.is_empty() {
        println!();
        println!("{}", "[Failed Movies]".bold().red());
        for failed in &report.failed {
            println!(
                "  {} {} - {}",
                failed.remote_id,
                failed.title,
                failed.reason
            );
        }
    }
    println!();
}
