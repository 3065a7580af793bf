//! Server configuration
//!
//! Loaded from a TOML file when one is given, otherwise built from defaults.
//! Every field is optional in the file so partial configs work.

use anyhow::{Context, Result};
use carl_core::schema::is_valid_name;
use carl_core::AliasTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/ghostdevv/carl/main/packages/cli/install.lua";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Aliases available without any configuration
pub fn default_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "glib".to_string(),
        "https://raw.githubusercontent.com/ghostdevv/cc-glib/main/repository.json".to_string(),
    )])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarlConfig {
    /// Address the HTTP server listens on
    pub bind: String,

    /// Public origin used when rewriting file URLs; `http://<bind>` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    /// Script served by `GET /install`
    pub install_script_url: String,

    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,

    /// Repository aliases: short name → definition URL
    pub aliases: BTreeMap<String, String>,
}

impl Default for CarlConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            public_url: None,
            install_script_url: DEFAULT_INSTALL_SCRIPT_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            aliases: default_aliases(),
        }
    }
}

impl CarlConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        if let Err(errors) = config.validate() {
            anyhow::bail!(
                "Config validation failed in {}:\n  {}",
                path.display(),
                errors.join("\n  ")
            );
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for common errors
    ///
    /// Returns Ok(()) if valid, or Err with a list of error messages
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.bind.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("bind '{}' is not a socket address", self.bind));
        }

        if let Some(public_url) = &self.public_url {
            if let Err(e) = Url::parse(public_url) {
                errors.push(format!("public_url '{}' is invalid: {}", public_url, e));
            }
        }

        if let Err(e) = Url::parse(&self.install_script_url) {
            errors.push(format!(
                "install_script_url '{}' is invalid: {}",
                self.install_script_url, e
            ));
        }

        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be greater than zero".to_string());
        }

        for (alias, url) in &self.aliases {
            if !is_valid_name(alias) {
                errors.push(format!(
                    "alias '{}' must be 1-32 characters of letters, digits, '_' or '-'",
                    alias
                ));
            }
            if let Err(e) = Url::parse(url) {
                errors.push(format!("alias '{}' has invalid URL '{}': {}", alias, url, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the immutable alias table; assumes `validate` passed
    pub fn alias_table(&self) -> Result<AliasTable> {
        self.aliases
            .iter()
            .map(|(name, url)| {
                Url::parse(url)
                    .map(|url| (name.clone(), url))
                    .with_context(|| format!("Invalid URL for alias '{}'", name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = CarlConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.aliases.contains_key("glib"));
        assert!(config.alias_table().unwrap().get("glib").is_some());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = CarlConfig::from_toml(
            r#"
            public_url = "https://carl.example"

            [aliases]
            mine = "https://example.com/repo.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.public_url.as_deref(), Some("https://carl.example"));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        // an explicit table replaces the default aliases
        assert_eq!(config.aliases.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = CarlConfig::default();
        config.bind = "nowhere".to_string();
        config.request_timeout_secs = 0;
        config
            .aliases
            .insert("bad name".to_string(), "not a url".to_string());

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].contains("bind"));
        assert!(errors.iter().any(|e| e.contains("request_timeout_secs")));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind = \"0.0.0.0:9000\"").unwrap();

        let config = CarlConfig::load(file.path()).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 0").unwrap();

        let err = CarlConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Config validation failed"));
    }
}
