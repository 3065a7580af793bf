use async_trait::async_trait;
use std::time::Duration;
use crate::error::CarlError;

/// Shared key/value store backing the repository cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the store by key
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Set a value in the store.
    ///
    /// `ttl` is a retention hint for stores with native expiry; freshness is
    /// decided by the reader, not the store.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CarlError>;
}
