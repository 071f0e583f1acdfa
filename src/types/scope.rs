//! Structure scope classification

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Distinguishes full page templates from flexible content elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Page,
    Fce,
}

impl Scope {
    /// Numeric code as persisted in the `scope` column
    pub fn code(self) -> i64 {
        match self {
            Scope::Page => 1,
            Scope::Fce => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Scope::Page),
            2 => Some(Scope::Fce),
            _ => None,
        }
    }

    /// Accepts `"page"`, `"fce"` (any case) or a numeric code given as text
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "page" => Some(Scope::Page),
            "fce" => Some(Scope::Fce),
            other => other.parse::<i64>().ok().and_then(Self::from_code),
        }
    }

    /// Reads a scope from a loosely typed configuration or row value
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(Self::from_code),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Page => write!(f, "page"),
            Scope::Fce => write!(f, "fce"),
        }
    }
}
