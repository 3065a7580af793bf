use crate::error::CarlError;
use crate::runtime::{CacheStore, TimeProvider};
use crate::schema::Repository;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// How long a resolved repository stays fresh after it is written
pub const CACHE_TTL: Duration = Duration::from_millis(300_000);

/// A cached repository and its expiry as a Unix timestamp in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub repository: Repository,
    pub expires: i64,
}

/// Expiring view over a [`CacheStore`]
///
/// Entries are stored as serialized snapshots. An expired entry reads as a
/// miss and stays in the store until the next write to the same key.
pub struct TtlCache<C: CacheStore, T: TimeProvider> {
    store: C,
    time_provider: T,
}

impl<C: CacheStore, T: TimeProvider> TtlCache<C, T> {
    pub fn new(store: C, time_provider: T) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.time_provider.unix_millis()
    }

    /// Get a fresh entry, or `None` if it is absent, expired or unreadable
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let bytes = self.store.get(key).await?;

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable cache entry for {}: {}", key, e);
                return None;
            }
        };

        if entry.expires > self.now_millis() {
            Some(entry)
        } else {
            debug!("Cache entry for {} expired at {}", key, entry.expires);
            None
        }
    }

    pub async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CarlError> {
        let bytes = serde_json::to_vec(entry)?;
        self.store.set(key, bytes, CACHE_TTL).await
    }

    /// Store a repository with the standard TTL measured from now
    pub async fn put_fresh(&self, key: &str, repository: &Repository) -> Result<CacheEntry, CarlError> {
        let entry = CacheEntry {
            repository: repository.clone(),
            expires: self.now_millis() + CACHE_TTL.as_millis() as i64,
        };
        self.put(key, &entry).await?;
        Ok(entry)
    }
}
