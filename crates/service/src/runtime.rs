//! Runtime wiring
//!
//! Builds the ledger and the stats gateway from `configs::AppConfig` so
//! binaries don't have to know which store or transport backs them.

use std::sync::Arc;

use configs::AppConfig;
use tracing::info;

use crate::errors::ServiceError;
use crate::ledger::LocalOrderLedger;
use crate::stats::{HttpStatsSource, StatsGateway};
use crate::storage::{FileKvStore, KvStore};

pub struct Storefront {
    pub stats: StatsGateway<HttpStatsSource>,
    pub ledger: LocalOrderLedger,
}

/// Ensure the data directory for the local store exists.
pub async fn ensure_env(cfg: &AppConfig) -> anyhow::Result<()> {
    common::env::ensure_data_dir(&cfg.storage.path).await
}

pub fn build_stats(cfg: &AppConfig) -> Result<StatsGateway<HttpStatsSource>, ServiceError> {
    let source = HttpStatsSource::new(cfg.api.base_url.clone(), cfg.api.timeout())?;
    Ok(StatsGateway::with_fallbacks(source, cfg.stats.fallbacks.clone()))
}

pub fn build_ledger(cfg: &AppConfig, store: Arc<dyn KvStore>) -> LocalOrderLedger {
    LocalOrderLedger::new(store, cfg.storage.orders_key.clone(), cfg.storage.user_key.clone())
}

/// File-backed ledger plus HTTP stats, as configured.
pub async fn build(cfg: &AppConfig) -> Result<Storefront, ServiceError> {
    let store = FileKvStore::new(&cfg.storage.path).await?;
    info!(path = %store.path().display(), base_url = %cfg.api.base_url, "storefront data layer ready");
    Ok(Storefront { stats: build_stats(cfg)?, ledger: build_ledger(cfg, store) })
}
