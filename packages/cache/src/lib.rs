// ABOUTME: Key-value cache capability for validated generation results
// ABOUTME: In-memory (moka) and SQLite backends plus deterministic input fingerprints

pub mod fingerprint;
pub mod memory;
pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use fingerprint::fingerprint;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A shared, mutation-tolerant key-value store. Values for a key are expected
/// to be interchangeable, so concurrent writers may race and the last one wins.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
    async fn delete(&self, key: &str) -> CacheResult<()>;
}
