pub mod http;
pub mod time;
pub mod cache;

pub use http::HttpClient;
pub use time::TimeProvider;
pub use cache::CacheStore;
