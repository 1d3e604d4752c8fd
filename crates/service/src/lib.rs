//! Storefront data-access layer.
//! - `storage`: key-value slot stores (file-backed, in-memory).
//! - `identity`: explicit order-owner identity and the stored current user.
//! - `ledger`: locally persisted orders.
//! - `stats`: admin dashboard statistics with fallbacks.
//! - `runtime`: wiring from configuration.

pub mod errors;
pub mod identity;
pub mod ledger;
pub mod runtime;
pub mod stats;
pub mod storage;

pub use errors::ServiceError;
pub use identity::{IdentityResolver, UserIdentity};
pub use ledger::LocalOrderLedger;
pub use stats::{HttpStatsSource, StatsGateway, StatsSource};
pub use storage::{FileKvStore, KvStore, MemoryKvStore};
