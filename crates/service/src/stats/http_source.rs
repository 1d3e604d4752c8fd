use std::time::Duration;

use async_trait::async_trait;
use common::{http, FetchError};
use models::{ProductStat, RecentOrder, SalesData, UserStat};
use reqwest::Client;
use tracing::debug;

use super::{StatsSource, PRODUCT_STATS_PATH, RECENT_ORDERS_PATH, SALES_DATA_PATH, USER_STATS_PATH};

/// Reads statistics from the admin HTTP API: one GET per view, no retry.
#[derive(Clone, Debug)]
pub struct HttpStatsSource {
    client: Client,
    base_url: String,
}

impl HttpStatsSource {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        Ok(Self { client: http::build_client(timeout)?, base_url: base_url.into() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = http::join_url(&self.base_url, path);
        debug!(%url, "fetching stats");
        http::get_json(&self.client, &url).await
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn recent_orders(&self) -> Result<Vec<RecentOrder>, FetchError> {
        self.get(RECENT_ORDERS_PATH).await
    }

    async fn product_stats(&self) -> Result<ProductStat, FetchError> {
        self.get(PRODUCT_STATS_PATH).await
    }

    async fn user_stats(&self) -> Result<UserStat, FetchError> {
        self.get(USER_STATS_PATH).await
    }

    async fn sales_data(&self) -> Result<SalesData, FetchError> {
        self.get(SALES_DATA_PATH).await
    }
}
