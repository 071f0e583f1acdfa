//! Static structure configuration entries

use crate::types::{RegistryError, Result, Scope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Raw, loosely typed entry as registered by configuration or the scanner
pub type RawEntry = Map<String, Value>;

/// A structure definition file known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfigEntry {
    /// Path relative to the site root
    pub path: String,
    pub title: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Locations the entry is offered at; empty means everywhere
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_pids: Vec<i64>,
}

impl StaticConfigEntry {
    pub fn new(path: impl Into<String>, title: impl Into<String>, scope: Scope) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            scope,
            icon: None,
            storage_pids: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_storage_pids(mut self, pids: Vec<i64>) -> Self {
        self.storage_pids = pids;
        self
    }

    /// Deduplication key over path, title and scope
    ///
    /// Two entries describing the same file under different titles or scopes
    /// keep distinct keys.
    pub fn composite_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.path.as_bytes());
        hasher.update(self.title.as_bytes());
        hasher.update(self.scope.code().to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn applies_to(&self, pid: i64) -> bool {
        self.storage_pids.is_empty() || self.storage_pids.contains(&pid)
    }

    /// Parse a registered raw entry
    ///
    /// `path`, `title` and `scope` are required. `storage_pids` may be a
    /// comma separated string, a single number or an array.
    pub fn from_raw(raw: &RawEntry) -> Result<Self> {
        let path = required_str(raw, "path")?;
        let title = required_str(raw, "title")?;

        let scope = raw
            .get("scope")
            .and_then(Scope::from_value)
            .ok_or_else(|| {
                RegistryError::ConfigurationMalformed(format!(
                    "entry '{}' has no recognizable scope",
                    path
                ))
            })?;

        let icon = match raw.get("icon") {
            Some(Value::String(icon)) if !icon.trim().is_empty() => Some(icon.clone()),
            _ => None,
        };

        let storage_pids = match raw.get("storage_pids") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => parse_pids(value).ok_or_else(|| {
                RegistryError::ConfigurationMalformed(format!(
                    "entry '{}' has invalid storage_pids: {}",
                    path, value
                ))
            })?,
        };

        Ok(Self {
            path,
            title,
            scope,
            icon,
            storage_pids,
        })
    }

    pub fn to_raw(&self) -> RawEntry {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn required_str(raw: &RawEntry, key: &str) -> Result<String> {
    match raw.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(other) => Err(RegistryError::ConfigurationMalformed(format!(
            "'{}' must be a non-empty string, got {}",
            key, other
        ))),
        None => Err(RegistryError::ConfigurationMalformed(format!(
            "missing required key '{}'",
            key
        ))),
    }
}

fn parse_pids(value: &Value) -> Option<Vec<i64>> {
    match value {
        Value::Number(n) => n.as_i64().map(|n| vec![n]),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse().ok())
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}
