use async_trait::async_trait;
use carl_core::runtime::{CacheStore, HttpClient, TimeProvider};
use carl_core::CarlError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Native HTTP client using reqwest
#[derive(Clone)]
pub struct NativeHttpClient {
    client: reqwest::Client,
}

impl NativeHttpClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl HttpClient for NativeHttpClient {
    async fn get(&self, url: &str) -> Result<String, CarlError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CarlError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CarlError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("upstream returned {}", status),
            });
        }

        response.text().await.map_err(|e| CarlError::fetch(url, e))
    }
}

/// Native time provider using chrono
#[derive(Clone, Copy)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

/// In-memory store shared by every request in the process
///
/// Entries are retained for the TTL hint given on write; expired entries are
/// swept on the next write.
#[derive(Clone)]
pub struct InMemoryCache<T: TimeProvider = SystemTimeProvider> {
    store: Arc<Mutex<HashMap<String, (Vec<u8>, i64)>>>,
    time_provider: T,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_time_provider(SystemTimeProvider)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeProvider> InMemoryCache<T> {
    pub fn with_time_provider(time_provider: T) -> Self {
        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
            time_provider,
        }
    }
}

#[async_trait]
impl<T: TimeProvider> CacheStore for InMemoryCache<T> {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let store = self.store.lock().ok()?;
        store.get(key).map(|(data, _)| data.clone())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CarlError> {
        let now = self.time_provider.unix_millis();
        let retain_until = now.saturating_add(ttl.as_millis() as i64);

        let mut store = self
            .store
            .lock()
            .map_err(|e| CarlError::Cache(e.to_string()))?;
        store.retain(|_, (_, until)| *until > now);
        store.insert(key.to_string(), (value, retain_until));
        Ok(())
    }
}
