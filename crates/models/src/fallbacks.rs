//! Substitute dashboard data used when the stats service cannot be reached.
//!
//! The defaults are the development placeholders the admin dashboard has
//! always shown offline. Deployments can replace any of them through config.

use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;
use crate::stats::{
    LowStockProduct, ProductStat, RecentOrder, SalesData, SalesDirection, TopSellingProduct,
    UserStat,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsFallbacks {
    pub recent_orders: Vec<RecentOrder>,
    pub product_stats: ProductStat,
    pub user_stats: UserStat,
    pub sales_data: SalesData,
}

fn recent(id: &str, customer: &str, total: f64, status: OrderStatus, date: &str) -> RecentOrder {
    RecentOrder {
        id: id.into(),
        customer: customer.into(),
        total,
        status,
        date: date.into(),
    }
}

fn top(name: &str, sold: u64) -> TopSellingProduct {
    TopSellingProduct { name: name.into(), sold }
}

fn low(name: &str, stock: u64) -> LowStockProduct {
    LowStockProduct { name: name.into(), stock }
}

impl Default for StatsFallbacks {
    fn default() -> Self {
        use OrderStatus::*;
        Self {
            recent_orders: vec![
                recent("ORD001", "John Doe", 129.99, Completed, "2023-05-15"),
                recent("ORD002", "Jane Smith", 79.50, Processing, "2023-05-14"),
                recent("ORD003", "Robert Johnson", 199.99, Completed, "2023-05-13"),
                recent("ORD004", "Emily Davis", 149.95, Shipped, "2023-05-12"),
                recent("ORD005", "Michael Brown", 89.99, Processing, "2023-05-11"),
            ],
            product_stats: ProductStat {
                total_products: 128,
                top_selling: vec![
                    top("Premium Phone Case", 245),
                    top("Screen Protector Ultra", 189),
                    top("Wireless Charger", 156),
                ],
                low_stock: vec![
                    low("Designer Phone Case", 5),
                    low("Fast Charging Cable", 8),
                    low("Bluetooth Earbuds", 10),
                ],
            },
            user_stats: UserStat { total_users: 1247, new_users: 28, active_users: 632 },
            sales_data: SalesData { total: 12689.50, change: 10.1, direction: SalesDirection::Up },
        }
    }
}
