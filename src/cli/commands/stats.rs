//! Stats command implementation.

use super::open_store;
use crate::models::config::Config;
use crate::store::Repository;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Print row counts of the catalog store.
pub async fn stats(config: &Config, store: Option<&Path>) -> Result<()> {
    let store = open_store(config, store).await?;
    let stats = store.stats().await?;

    println!("{}", "[STATS] Catalog".bold().cyan());
    println!();
    println!("  {} {}", "Store:".bold(), store.path().display());
    println!("  {} {}", "Movies:".bold(), stats.movies);
    println!("  {} {}", "Categories:".bold(), stats.categories);
    println!("  {} {}", "Directors:".bold(), stats.directors);
    println!("  {} {}", "Actors:".bold(), stats.actors);
    println!("  {} {}", "Cast links:".bold(), stats.movie_actors);

    let unlinked = store
        .list_categories()
        .await?
        .iter()
        .filter(|c| c.remote_id.is_none())
        .count();
    if unlinked > 0 {
        println!();
        println!(
            "{} {} categories have no TMDB genre id",
            "[NOTE]".yellow(),
            unlinked
        );
    }

    Ok(())
}
