pub mod app;
pub mod config;
pub mod logging;
pub mod relay;
pub mod runtime_impl;
pub mod server;

pub use app::{router, ApiError, AppState};
pub use config::CarlConfig;
