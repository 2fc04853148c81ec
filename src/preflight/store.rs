//! Catalog store preflight check.

use super::CheckResult;
use crate::store::SqliteStore;
use std::path::Path;
use tokio::fs;

/// Check that the catalog database can be opened and its directory written.
pub async fn check(path: &Path) -> CheckResult {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if let Err(e) = fs::create_dir_all(dir).await {
        return CheckResult::fail(
            "Catalog store",
            &format!("cannot create {}: {}", dir.display(), e),
            "Choose another location with --store",
        );
    }

    let scratch = dir.join(format!(".catalog_sync_write_test_{}", std::process::id()));
    if let Err(e) = fs::write(&scratch, b"").await {
        return CheckResult::fail(
            "Catalog store",
            &format!("{} is not writable: {}", dir.display(), e),
            "Choose another location with --store",
        );
    }
    let _ = fs::remove_file(&scratch).await;

    match SqliteStore::open(path).await {
        Ok(store) => {
            store.close().await;
            CheckResult::ok("Catalog store", &path.display().to_string())
        }
        Err(e) => CheckResult::fail(
            "Catalog store",
            &e.to_string(),
            "Move the file aside or choose another location with --store",
        ),
    }
}
