//! CLI command implementations.

pub mod genres;
pub mod reset;
pub mod stats;
pub mod sync;

use crate::models::config::Config;
use crate::store::SqliteStore;
use crate::Result;
use std::path::Path;

/// Open the catalog database, preferring the command line path over the config.
pub async fn open_store(config: &Config, store: Option<&Path>) -> Result<SqliteStore> {
    let path = store.unwrap_or(config.store_path.as_path());
    tracing::debug!("Opening catalog store: {}", path.display());
    SqliteStore::open(path).await
}
