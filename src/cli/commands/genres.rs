//! Genres command implementation.

use super::open_store;
use crate::core::resolver::EntityResolver;
use crate::models::config::Config;
use crate::services::rate_limit::Pacing;
use crate::services::tmdb::TmdbClient;
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Create a category for every TMDB movie genre.
pub async fn genres(config: &Config, store: Option<&Path>) -> Result<()> {
    println!("{}", "[GENRES] Syncing TMDB genres...".bold().cyan());
    println!();

    let client = TmdbClient::from_config(config)?;
    let source = Pacing::from_config(&config.rate_limit)
        .wrap(Arc::new(client), &CancellationToken::new());
    let store = Arc::new(open_store(config, store).await?);
    let before = store.stats().await?.categories;

    let resolver = EntityResolver::load(source, store.clone()).await?;
    let categories = resolver.sync_genres().await?;

    for category in &categories {
        let genre_id = category
            .remote_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<6} {:<8} {}", category.id, genre_id, category.name);
    }

    let after = store.stats().await?.categories;
    println!();
    println!("{}", "[Summary]".bold().green());
    println!("  {} {}", "Genres:".bold(), categories.len());
    println!("  {} {}", "Categories created:".bold(), after.saturating_sub(before));
    Ok(())
}
