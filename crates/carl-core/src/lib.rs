pub mod cache;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod runtime;
pub mod schema;

pub use cache::{CacheEntry, TtlCache, CACHE_TTL};
pub use error::{CarlError, SchemaViolation};
pub use host::{AliasTable, HostResolver, RepositoryHost};
pub use pipeline::{proxy_url, RepositoryResolver, ResolvedPackage};
pub use schema::{validate, FileRef, Package, PackageKind, Repository};
