//! Repository host resolution
//!
//! Turns a repository name and an optional definition URL into the URL the
//! pipeline fetches. Well-known repositories are reachable by alias; anything
//! else must be given as an explicit absolute URL.

use crate::error::CarlError;
use std::collections::HashMap;
use url::Url;

/// Where a repository definition lives, and the name it is expected to carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHost {
    pub name: Option<String>,
    pub url: Url,
}

/// Alias name → definition URL, fixed for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, Url>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, name: impl Into<String>, url: Url) -> Self {
        self.aliases.insert(name.into(), url);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Url> {
        self.aliases.get(name)
    }
}

impl FromIterator<(String, Url)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (String, Url)>>(iter: I) -> Self {
        Self {
            aliases: iter.into_iter().collect(),
        }
    }
}

pub struct HostResolver {
    aliases: AliasTable,
}

impl HostResolver {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Resolve a repository name and/or custom definition URL
    ///
    /// A known alias wins and the custom URL is ignored. Otherwise the custom
    /// URL must be present and absolute.
    pub fn resolve(
        &self,
        name: Option<&str>,
        custom_url: Option<&str>,
    ) -> Result<RepositoryHost, CarlError> {
        if let Some(url) = name.and_then(|n| self.aliases.get(n)) {
            return Ok(RepositoryHost {
                name: name.map(str::to_string),
                url: url.clone(),
            });
        }

        let raw = custom_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| match name {
                Some(n) => CarlError::InvalidUrl(format!(
                    "'{n}' is not a known repository and no definitionURL was given"
                )),
                None => CarlError::InvalidUrl("no definitionURL was given".to_string()),
            })?;

        let url = Url::parse(raw).map_err(|e| CarlError::InvalidUrl(format!("{raw}: {e}")))?;

        Ok(RepositoryHost {
            name: name.map(str::to_string),
            url,
        })
    }
}
