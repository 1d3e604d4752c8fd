use common::FetchError;
use models::{DashboardSnapshot, ProductStat, RecentOrder, SalesData, StatsFallbacks, UserStat};
use tracing::error;

use super::StatsSource;

/// Dashboard-facing statistics: every view always yields data.
///
/// A failed fetch is logged once and answered with the configured fallback
/// for that view. Callers that need to see the failure use [`Self::source`].
pub struct StatsGateway<S> {
    source: S,
    fallbacks: StatsFallbacks,
}

impl<S: StatsSource> StatsGateway<S> {
    /// Gateway with the built-in placeholder fallbacks.
    pub fn new(source: S) -> Self {
        Self::with_fallbacks(source, StatsFallbacks::default())
    }

    pub fn with_fallbacks(source: S, fallbacks: StatsFallbacks) -> Self {
        Self { source, fallbacks }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get_recent_orders(&self) -> Vec<RecentOrder> {
        let res = self.source.recent_orders().await;
        or_fallback("recent orders", res, &self.fallbacks.recent_orders)
    }

    pub async fn get_product_stats(&self) -> ProductStat {
        let res = self.source.product_stats().await;
        or_fallback("product stats", res, &self.fallbacks.product_stats)
    }

    pub async fn get_user_stats(&self) -> UserStat {
        let res = self.source.user_stats().await;
        or_fallback("user stats", res, &self.fallbacks.user_stats)
    }

    pub async fn get_sales_data(&self) -> SalesData {
        let res = self.source.sales_data().await;
        or_fallback("sales data", res, &self.fallbacks.sales_data)
    }

    /// All four views, fetched concurrently.
    pub async fn get_dashboard(&self) -> DashboardSnapshot {
        let (recent_orders, product_stats, user_stats, sales_data) = tokio::join!(
            self.get_recent_orders(),
            self.get_product_stats(),
            self.get_user_stats(),
            self.get_sales_data(),
        );
        DashboardSnapshot { recent_orders, product_stats, user_stats, sales_data }
    }
}

fn or_fallback<T: Clone>(view: &'static str, res: Result<T, FetchError>, fallback: &T) -> T {
    match res {
        Ok(v) => v,
        Err(e) => {
            error!(view, kind = e.kind(), error = %e, "error fetching {view}; serving fallback");
            fallback.clone()
        }
    }
}
