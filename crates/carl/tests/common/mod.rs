//! Shared harness for HTTP tests
//!
//! Spins up an upstream host serving repository definitions and files, and a
//! carl server configured to use it. Both bind to 127.0.0.1:0.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use carl::config::CarlConfig;
use carl::{router, AppState};
use futures_util::StreamExt;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const PUBLIC_URL: &str = "http://carl.test";

/// Delay before each chunk of `/slow`
pub const SLOW_CHUNK_DELAY: Duration = Duration::from_millis(500);

pub struct TestServers {
    pub upstream: SocketAddr,
    pub carl: SocketAddr,
    pub definition_hits: Arc<AtomicUsize>,
    pub client: reqwest::Client,
}

impl TestServers {
    pub fn upstream_url(&self, path: &str) -> String {
        format!("http://{}{}", self.upstream, path)
    }

    pub fn carl_url(&self, path: &str) -> String {
        format!("http://{}{}", self.carl, path)
    }

    pub fn definition_hits(&self) -> usize {
        self.definition_hits.load(Ordering::SeqCst)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.carl_url(path))
            .send()
            .await
            .expect("carl server should respond")
    }
}

async fn glib_definition(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    axum::Json(json!({
        "name": "glib",
        "packages": [{
            "name": "neofetch",
            "version": "0.1.0",
            "cli": "neofetch.lua",
            "files": [{ "url": "lib/neofetch.lua", "path": "neofetch.lua" }]
        }]
    }))
}

async fn other_definition() -> impl IntoResponse {
    axum::Json(json!({ "name": "other", "packages": [] }))
}

async fn invalid_definition() -> impl IntoResponse {
    axum::Json(json!({
        "name": "broken",
        "packages": [{ "name": "x", "version": "1.2", "files": [] }]
    }))
}

async fn neofetch_lua() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "print('neofetch')")
}

async fn install_lua() -> impl IntoResponse {
    "-- carl installer"
}

async fn empty() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn slow() -> impl IntoResponse {
    let chunks = futures_util::stream::iter(0..3).then(|i| async move {
        tokio::time::sleep(SLOW_CHUNK_DELAY).await;
        Ok::<_, std::io::Error>(format!("chunk{i};"))
    });
    Body::from_stream(chunks)
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn start() -> TestServers {
    start_with(|_| {}).await
}

/// Start both servers, letting the caller adjust carl's config first
pub async fn start_with(configure: impl FnOnce(&mut CarlConfig)) -> TestServers {
    let definition_hits = Arc::new(AtomicUsize::new(0));

    let upstream_app = Router::new()
        .route("/dir/repo.json", get(glib_definition))
        .route("/dir/lib/neofetch.lua", get(neofetch_lua))
        .route("/other.json", get(other_definition))
        .route("/broken.json", get(invalid_definition))
        .route("/install.lua", get(install_lua))
        .route("/empty", get(empty))
        .route("/slow", get(slow))
        .with_state(definition_hits.clone());
    let upstream = spawn(upstream_app).await;

    let mut config = CarlConfig::default();
    config.public_url = Some(PUBLIC_URL.to_string());
    config.install_script_url = format!("http://{}/install.lua", upstream);
    config.aliases.clear();
    config
        .aliases
        .insert("glib".to_string(), format!("http://{}/dir/repo.json", upstream));
    config
        .aliases
        .insert("renamed".to_string(), format!("http://{}/other.json", upstream));
    configure(&mut config);
    assert!(config.validate().is_ok());

    let state = AppState::from_config(&config).unwrap();
    let carl = spawn(router(state)).await;

    TestServers {
        upstream,
        carl,
        definition_hits,
        client: reqwest::Client::new(),
    }
}
