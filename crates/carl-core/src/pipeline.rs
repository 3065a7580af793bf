//! Repository resolution pipeline
//!
//! cache lookup → fetch → validate → name check → file URL rewrite →
//! cli check → cache write. Any failure aborts the whole resolution; a
//! partially rewritten repository is never returned or cached.

use crate::cache::TtlCache;
use crate::error::CarlError;
use crate::host::RepositoryHost;
use crate::runtime::{CacheStore, HttpClient, TimeProvider};
use crate::schema::{self, Package, Repository};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A package together with the name of the repository it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    #[serde(flatten)]
    pub package: Package,
    pub repo: String,
}

/// Resolves repository definitions using runtime abstractions for HTTP,
/// time and caching
pub struct RepositoryResolver<H: HttpClient, T: TimeProvider, C: CacheStore> {
    http_client: H,
    cache: TtlCache<C, T>,
    proxy_origin: String,
}

impl<H: HttpClient, T: TimeProvider, C: CacheStore> RepositoryResolver<H, T, C> {
    pub fn new(http_client: H, time_provider: T, cache_store: C) -> Self {
        Self {
            http_client,
            cache: TtlCache::new(cache_store, time_provider),
            proxy_origin: String::new(),
        }
    }

    /// Origin of the download relay that rewritten file URLs point at
    pub fn with_proxy_origin(mut self, origin: impl Into<String>) -> Self {
        self.proxy_origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    pub fn proxy_origin(&self) -> &str {
        &self.proxy_origin
    }

    /// Resolve a repository, serving from cache while the entry is fresh
    #[instrument(skip(self, host), fields(url = %host.url))]
    pub async fn resolve(&self, host: &RepositoryHost) -> Result<Repository, CarlError> {
        let key = host.url.as_str();

        if let Some(entry) = self.cache.get(key).await {
            debug!("Cache hit for {}", key);
            check_name(host, &entry.repository)?;
            return Ok(entry.repository);
        }
        debug!("Cache miss for {}", key);

        let raw = self.fetch(&host.url).await?;
        let mut definition = schema::validate(&raw)?;
        check_name(host, &definition)?;

        self.rewrite_file_urls(&host.url, &mut definition)?;
        check_cli_files(&definition)?;

        let entry = self.cache.put_fresh(key, &definition).await?;
        info!(
            "Cached repository '{}' ({} packages) until {}",
            definition.name,
            definition.packages.len(),
            entry.expires
        );

        Ok(definition)
    }

    /// Resolve a repository and look up one of its packages
    pub async fn resolve_package(
        &self,
        host: &RepositoryHost,
        package: &str,
    ) -> Result<ResolvedPackage, CarlError> {
        let repository = self.resolve(host).await?;
        let found = repository
            .package(package)
            .cloned()
            .ok_or_else(|| CarlError::PackageNotFound {
                repository: repository.name.clone(),
                package: package.to_string(),
            })?;
        Ok(ResolvedPackage {
            package: found,
            repo: repository.name,
        })
    }

    async fn fetch(&self, url: &Url) -> Result<serde_json::Value, CarlError> {
        info!("Fetching repository definition from {}", url);

        let body = self.http_client.get(url.as_str()).await.map_err(|e| match e {
            CarlError::Fetch {
                status: Some(404), ..
            } => CarlError::RepositoryNotFound(url.to_string()),
            other => {
                warn!("Fetch failed: {}", other);
                other
            }
        })?;

        serde_json::from_str(&body)
            .map_err(|e| CarlError::fetch(url.as_str(), format!("response is not JSON: {e}")))
    }

    fn rewrite_file_urls(&self, source: &Url, definition: &mut Repository) -> Result<(), CarlError> {
        for package in &mut definition.packages {
            for file in &mut package.files {
                let resolved = source
                    .join(&file.url)
                    .map_err(|e| CarlError::InvalidUrl(format!("{}: {}", file.url, e)))?;
                file.url = proxy_url(&self.proxy_origin, &resolved);
            }
        }
        Ok(())
    }
}

/// Wrap a resolved file URL so it is downloaded through the relay
pub fn proxy_url(proxy_origin: &str, resolved: &Url) -> String {
    format!(
        "{}/file?url={}",
        proxy_origin.trim_end_matches('/'),
        urlencoding::encode(resolved.as_str())
    )
}

fn check_name(host: &RepositoryHost, repository: &Repository) -> Result<(), CarlError> {
    match &host.name {
        Some(expected) if *expected != repository.name => Err(CarlError::NameMismatch {
            expected: expected.clone(),
            found: repository.name.clone(),
        }),
        _ => Ok(()),
    }
}

fn check_cli_files(repository: &Repository) -> Result<(), CarlError> {
    for package in &repository.packages {
        if let Some(cli) = &package.cli {
            if !package.has_file(cli) {
                return Err(CarlError::MissingCliFile {
                    package: package.name.clone(),
                    cli: cli.clone(),
                });
            }
        }
    }
    Ok(())
}
