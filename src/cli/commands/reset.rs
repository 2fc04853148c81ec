//! Reset command implementation.

use super::open_store;
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Delete every row of the catalog store.
pub async fn reset(config: &Config, store: Option<&Path>, confirm: bool) -> Result<()> {
    let store = open_store(config, store).await?;
    let before = store.stats().await?;

    if !confirm {
        println!("{}", "[WARNING] This will delete the whole catalog!".bold().yellow());
        println!();
        println!("  {} {}", "Movies:".bold(), before.movies);
        println!("  {} {}", "Categories:".bold(), before.categories);
        println!("  {} {}", "Directors:".bold(), before.directors);
        println!("  {} {}", "Actors:".bold(), before.actors);
        println!();
        println!("Run again with {} to proceed.", "--confirm".bold());
        return Ok(());
    }

    store.reset().await?;

    println!("{}", "[RESET] Catalog cleared".bold().green());
    println!("  {} {}", "Movies removed:".bold(), before.movies);
    println!("  {} {}", "Categories removed:".bold(), before.categories);
    println!("  {} {}", "Directors removed:".bold(), before.directors);
    println!("  {} {}", "Actors removed:".bold(), before.actors);
    println!("  {} {}", "Store:".bold(), store.path().display());
    Ok(())
}
