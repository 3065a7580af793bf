use async_trait::async_trait;
use crate::error::CarlError;

/// HTTP client abstraction for fetching repository definitions
/// Implementations must be Send + Sync for use across async boundaries
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and return the response body as text.
    ///
    /// Non-success statuses fail with `CarlError::Fetch` carrying the status code.
    async fn get(&self, url: &str) -> Result<String, CarlError>;
}
