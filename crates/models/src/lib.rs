//! Domain types shared by the storefront data-access layer.
//! - `order`: locally persisted orders and cart line items.
//! - `stats`: admin dashboard DTOs returned by the remote service.
//! - `user`: the stored "current user" record.
//! - `fallbacks`: substitute dashboard data for offline use.

mod de;
pub mod errors;
pub mod fallbacks;
pub mod order;
pub mod stats;
pub mod user;

pub use fallbacks::StatsFallbacks;
pub use order::{CartItem, CartProduct, Order, OrderStatus};
pub use stats::{
    DashboardSnapshot, LowStockProduct, ProductStat, RecentOrder, SalesData, SalesDirection,
    TopSellingProduct, UserStat,
};
pub use user::UserRecord;
