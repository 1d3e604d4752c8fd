//! Admin dashboard statistics.
//!
//! `StatsSource` is the fallible read API; `StatsGateway` layers the
//! dashboard's never-fail behaviour on top of it.

use async_trait::async_trait;
use common::FetchError;
use models::{ProductStat, RecentOrder, SalesData, UserStat};

pub mod gateway;
pub mod http_source;

pub use gateway::StatsGateway;
pub use http_source::HttpStatsSource;

pub const RECENT_ORDERS_PATH: &str = "/admin/orders/recent";
pub const PRODUCT_STATS_PATH: &str = "/admin/products/stats";
pub const USER_STATS_PATH: &str = "/admin/users/stats";
pub const SALES_DATA_PATH: &str = "/admin/sales/data";

/// Where dashboard statistics come from.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn recent_orders(&self) -> Result<Vec<RecentOrder>, FetchError>;
    async fn product_stats(&self) -> Result<ProductStat, FetchError>;
    async fn user_stats(&self) -> Result<UserStat, FetchError>;
    async fn sales_data(&self) -> Result<SalesData, FetchError>;
}
