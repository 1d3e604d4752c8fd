//! Environment/runtime helpers
//!
//! Sanity checks to ensure the local data directory exists at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the parent directory of the local store file exists.
pub async fn ensure_data_dir(store_path: &str) -> anyhow::Result<()> {
    let Some(dir) = Path::new(store_path).parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::metadata(dir).await.is_err() {
        warn!(dir = %dir.display(), "data directory not found; creating it");
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    info!(dir = %dir.display(), "data directory ready");
    Ok(())
}
