/// Time provider abstraction for getting current time
/// Allows for deterministic testing of cache expiry
pub trait TimeProvider: Send + Sync {
    /// Get the current UTC time
    fn now(&self) -> chrono::DateTime<chrono::Utc>;

    /// Get the current Unix timestamp in milliseconds
    fn unix_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}
