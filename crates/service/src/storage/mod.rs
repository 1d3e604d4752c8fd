//! Storage abstractions for the service layer
//!
//! `KvStore` is a string slot store addressed by key, the shape the web
//! client's browser storage had. Values are opaque strings; callers decide
//! the encoding (JSON everywhere in this crate).

use async_trait::async_trait;

use crate::errors::ServiceError;

pub mod file_store;
pub mod json_map_store;
pub mod memory_store;

pub use file_store::FileKvStore;
pub use memory_store::MemoryKvStore;

/// Key-value slot storage. Implementations can be in-memory, file-backed,
/// or a remote KV.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a slot; `Ok(None)` when it was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    /// Overwrite a slot.
    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError>;
    /// Clear a slot; returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, ServiceError>;
}
