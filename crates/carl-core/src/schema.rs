//! Repository definition model and validation
//!
//! A repository definition is a small JSON document naming a repository and
//! listing its packages together with the files each package installs.
//! [`validate`] checks an arbitrary JSON value against that shape and collects
//! every violation it finds rather than stopping at the first one.

use crate::error::{CarlError, SchemaViolation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Maximum length of repository and package names
pub const MAX_NAME_LEN: usize = 32;

/// Base used only to check that relative file URLs are well formed
const RELATIVE_CHECK_BASE: &str = "https://relative.invalid/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub packages: Vec<Package>,
}

impl Repository {
    /// Find a package by name
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    /// Path of the file to run when the package is used as a command
    #[serde(default)]
    pub cli: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PackageKind>,
    pub files: Vec<FileRef>,
}

impl Package {
    pub fn has_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Lib,
    Bin,
}

impl PackageKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "lib" => Some(Self::Lib),
            "bin" => Some(Self::Bin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub url: String,
    pub path: String,
}

/// Check whether a repository or package name is acceptable
///
/// Names must be 1 to 32 characters of ASCII letters, digits, `_` or `-`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check whether a version string is a SemVer 2.0 version
pub fn is_valid_version(version: &str) -> bool {
    semver::Version::parse(version).is_ok()
}

/// Check whether a file URL is absolute or a well-formed relative reference
pub fn is_valid_file_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    match Url::parse(url) {
        Ok(_) => true,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_CHECK_BASE)
            .and_then(|base| base.join(url))
            .is_ok(),
        Err(_) => false,
    }
}

/// Validate a parsed JSON value as a repository definition
///
/// Unknown fields are ignored.
pub fn validate(raw: &Value) -> Result<Repository, CarlError> {
    let mut violations = Vec::new();
    let repository = read_repository(raw, &mut violations);

    match repository {
        Some(repository) if violations.is_empty() => Ok(repository),
        _ => Err(CarlError::Schema(violations)),
    }
}

fn read_repository(raw: &Value, violations: &mut Vec<SchemaViolation>) -> Option<Repository> {
    let Some(obj) = raw.as_object() else {
        violations.push(SchemaViolation::new("$", "expected an object"));
        return None;
    };

    let name = read_name(obj, "name", violations);

    let packages = match obj.get("packages") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| read_package(item, &format!("packages[{i}]"), violations))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Option<Vec<_>>>(),
        Some(_) => {
            violations.push(SchemaViolation::new("packages", "expected an array"));
            None
        }
        None => {
            violations.push(SchemaViolation::new("packages", "is required"));
            None
        }
    };

    Some(Repository {
        name: name?,
        packages: packages?,
    })
}

fn read_package(
    raw: &Value,
    at: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<Package> {
    let Some(obj) = raw.as_object() else {
        violations.push(SchemaViolation::new(at, "expected an object"));
        return None;
    };

    let name = read_name(obj, &format!("{at}.name"), violations);

    let version = read_string(obj, "version", at, violations).and_then(|v| {
        if is_valid_version(v) {
            Some(v.to_string())
        } else {
            violations.push(SchemaViolation::new(
                format!("{at}.version"),
                format!("'{v}' is not a valid semver version"),
            ));
            None
        }
    });

    let cli = match obj.get("cli") {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => {
            violations.push(SchemaViolation::new(
                format!("{at}.cli"),
                "expected a string or null",
            ));
            None
        }
    };

    let kind = match obj.get("type") {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => match PackageKind::parse(s) {
            Some(kind) => Some(Some(kind)),
            None => {
                violations.push(SchemaViolation::new(
                    format!("{at}.type"),
                    format!("'{s}' is not one of: lib, bin"),
                ));
                None
            }
        },
        Some(_) => {
            violations.push(SchemaViolation::new(format!("{at}.type"), "expected a string"));
            None
        }
    };

    let files = match obj.get("files") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| read_file(item, &format!("{at}.files[{i}]"), violations))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Option<Vec<_>>>(),
        Some(_) => {
            violations.push(SchemaViolation::new(format!("{at}.files"), "expected an array"));
            None
        }
        None => {
            violations.push(SchemaViolation::new(format!("{at}.files"), "is required"));
            None
        }
    };

    Some(Package {
        name: name?,
        version: version?,
        cli: cli?,
        kind: kind?,
        files: files?,
    })
}

fn read_file(raw: &Value, at: &str, violations: &mut Vec<SchemaViolation>) -> Option<FileRef> {
    let Some(obj) = raw.as_object() else {
        violations.push(SchemaViolation::new(at, "expected an object"));
        return None;
    };

    let url = read_string(obj, "url", at, violations).and_then(|u| {
        if is_valid_file_url(u) {
            Some(u.to_string())
        } else {
            violations.push(SchemaViolation::new(
                format!("{at}.url"),
                format!("'{u}' is not a valid URL"),
            ));
            None
        }
    });
    let path = read_string(obj, "path", at, violations).map(str::to_string);

    Some(FileRef {
        url: url?,
        path: path?,
    })
}

fn read_name(
    obj: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<String> {
    match obj.get("name") {
        Some(Value::String(s)) if is_valid_name(s) => Some(s.clone()),
        Some(Value::String(s)) => {
            violations.push(SchemaViolation::new(
                path,
                format!(
                    "'{s}' must be 1-{MAX_NAME_LEN} characters of letters, digits, '_' or '-'"
                ),
            ));
            None
        }
        Some(_) => {
            violations.push(SchemaViolation::new(path, "expected a string"));
            None
        }
        None => {
            violations.push(SchemaViolation::new(path, "is required"));
            None
        }
    }
}

fn read_string<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    at: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<&'a str> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            violations.push(SchemaViolation::new(format!("{at}.{key}"), "expected a string"));
            None
        }
        None => {
            violations.push(SchemaViolation::new(format!("{at}.{key}"), "is required"));
            None
        }
    }
}
