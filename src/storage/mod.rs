//! Durable local storage layer.
//!
//! The cache and the mutation queue persist their state through the
//! [`LocalStore`] trait: opaque keyed blobs of serialized JSON. Persistence
//! is a best-effort cache-warm mechanism, not the system of record (the
//! remote service is), so store failures never roll back in-memory state.

use anyhow::Result;
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Opaque keyed storage for serialized engine state.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Bulk-clear every stored entry; used on sign-out.
    async fn clear(&self) -> Result<()>;
}
