use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

/// Row of the admin "recent orders" table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentOrder {
    pub id: String,
    pub customer: String,
    pub total: f64,
    pub status: OrderStatus,
    pub date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopSellingProduct {
    pub name: String,
    pub sold: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LowStockProduct {
    pub name: String,
    pub stock: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStat {
    pub total_products: u64,
    pub top_selling: Vec<TopSellingProduct>,
    pub low_stock: Vec<LowStockProduct>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStat {
    pub total_users: u64,
    pub new_users: u64,
    pub active_users: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesDirection {
    Up,
    Down,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesData {
    pub total: f64,
    pub change: f64,
    pub direction: SalesDirection,
}

/// All four dashboard views fetched together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub recent_orders: Vec<RecentOrder>,
    pub product_stats: ProductStat,
    pub user_stats: UserStat,
    pub sales_data: SalesData,
}
