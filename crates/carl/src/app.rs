//! HTTP surface
//!
//! Errors are always `{"error": message}` with a real HTTP status.

use crate::config::CarlConfig;
use crate::relay::{relay, relay_client, Relayed};
use crate::runtime_impl::{InMemoryCache, NativeHttpClient, SystemTimeProvider};
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use carl_core::{CarlError, HostResolver, Repository, RepositoryResolver, ResolvedPackage};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

pub type NativeResolver = RepositoryResolver<NativeHttpClient, SystemTimeProvider, InMemoryCache>;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    hosts: HostResolver,
    resolver: NativeResolver,
    relay_client: reqwest::Client,
    install_script_url: String,
}

impl AppState {
    /// Build the state for a validated config
    ///
    /// File URLs are rewritten to `public_url`, or to `http://<bind>` when no
    /// public origin is configured.
    pub fn from_config(config: &CarlConfig) -> Result<Self> {
        let http_client =
            NativeHttpClient::new(config.request_timeout()).context("Failed to build HTTP client")?;
        let relay_client =
            relay_client(config.request_timeout()).context("Failed to build relay client")?;
        let proxy_origin = config
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", config.bind));

        let resolver = RepositoryResolver::new(http_client, SystemTimeProvider, InMemoryCache::new())
            .with_proxy_origin(proxy_origin);
        let hosts = HostResolver::new(config.alias_table()?);

        Ok(Self {
            inner: Arc::new(Inner {
                hosts,
                resolver,
                relay_client,
                install_script_url: config.install_script_url.clone(),
            }),
        })
    }

    pub fn proxy_origin(&self) -> &str {
        self.inner.resolver.proxy_origin()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/file", get(file))
        .route("/pkg/{repository}/{package}", get(package))
        .route("/get/{repository}/{package}", get(package))
        .route("/repo", get(repository_by_url))
        .route("/repo/{repository}", get(repository_by_name))
        .route("/install", get(install))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing {0} query parameter")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Carl(#[from] CarlError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Carl(e) => match e {
                CarlError::RepositoryNotFound(_) | CarlError::PackageNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                CarlError::Cache(_) | CarlError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                CarlError::InvalidUrl(_)
                | CarlError::Fetch { .. }
                | CarlError::Schema(_)
                | CarlError::NameMismatch { .. }
                | CarlError::MissingCliFile { .. } => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DefinitionQuery {
    #[serde(rename = "definitionURL")]
    definition_url: Option<String>,
}

async fn file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Relayed, ApiError> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::MissingParameter("url"))?;
    Ok(relay(&state.inner.relay_client, &url).await?)
}

async fn package(
    State(state): State<AppState>,
    Path((repository, package)): Path<(String, String)>,
    Query(query): Query<DefinitionQuery>,
) -> Result<Json<ResolvedPackage>, ApiError> {
    let host = state
        .inner
        .hosts
        .resolve(Some(&repository), query.definition_url.as_deref())?;
    let found = state.inner.resolver.resolve_package(&host, &package).await?;
    Ok(Json(found))
}

async fn repository_by_name(
    State(state): State<AppState>,
    Path(repository): Path<String>,
    Query(query): Query<DefinitionQuery>,
) -> Result<Json<Repository>, ApiError> {
    resolve_repository(&state, Some(&repository), query.definition_url.as_deref()).await
}

async fn repository_by_url(
    State(state): State<AppState>,
    Query(query): Query<DefinitionQuery>,
) -> Result<Json<Repository>, ApiError> {
    resolve_repository(&state, None, query.definition_url.as_deref()).await
}

async fn resolve_repository(
    state: &AppState,
    name: Option<&str>,
    definition_url: Option<&str>,
) -> Result<Json<Repository>, ApiError> {
    let host = state.inner.hosts.resolve(name, definition_url)?;
    Ok(Json(state.inner.resolver.resolve(&host).await?))
}

async fn install(State(state): State<AppState>) -> Result<Relayed, ApiError> {
    let script = relay(&state.inner.relay_client, &state.inner.install_script_url).await?;
    Ok(script.with_content_type("text/lua"))
}
