//! Data structure definitions from both identity schemes

mod resolver;

pub use resolver::{StructureResolver, Token};

use crate::config::StaticConfigEntry;
use crate::storage::{row_int, row_str, Row};
use crate::types::Scope;
use serde::Serialize;
use std::cmp::Ordering;

/// Capabilities shared by every structure definition
pub trait DataStructure {
    /// Identity: the uid for records, the site-relative path for files
    fn key(&self) -> String;
    fn label(&self) -> &str;
    fn scope(&self) -> Option<Scope>;
    /// Locations the structure is offered at; empty means everywhere
    fn storage_pids(&self) -> Vec<i64>;
    fn icon(&self) -> Option<&str>;

    /// Value used for ordering listings
    fn sorting_field_value(&self) -> String {
        self.label().to_string()
    }
}

/// Row snapshot of a persisted structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureRecord {
    pub pid: i64,
    pub title: String,
    pub scope: Option<Scope>,
    pub icon: Option<String>,
}

impl StructureRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            pid: row_int(row, "pid").unwrap_or(0),
            title: row_str(row, "title").unwrap_or_default(),
            scope: row.get("scope").and_then(Scope::from_value),
            icon: row_str(row, "previewicon").filter(|i| !i.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStructure {
    uid: u64,
    record: Option<StructureRecord>,
}

impl DatabaseStructure {
    pub fn new(uid: u64, record: Option<StructureRecord>) -> Self {
        Self { uid, record }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn record(&self) -> Option<&StructureRecord> {
        self.record.as_ref()
    }

    /// False once the backing row is gone or soft-deleted
    pub fn is_valid(&self) -> bool {
        self.record.is_some()
    }
}

impl DataStructure for DatabaseStructure {
    fn key(&self) -> String {
        self.uid.to_string()
    }

    fn label(&self) -> &str {
        self.record.as_ref().map(|r| r.title.as_str()).unwrap_or("")
    }

    fn scope(&self) -> Option<Scope> {
        self.record.as_ref().and_then(|r| r.scope)
    }

    fn storage_pids(&self) -> Vec<i64> {
        self.record.iter().map(|r| r.pid).collect()
    }

    fn icon(&self) -> Option<&str> {
        self.record.as_ref().and_then(|r| r.icon.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStructure {
    path: String,
    entry: StaticConfigEntry,
}

impl StaticStructure {
    /// `path` is the normalized form of `entry.path`
    pub fn new(path: String, entry: StaticConfigEntry) -> Self {
        Self { path, entry }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entry(&self) -> &StaticConfigEntry {
        &self.entry
    }
}

impl DataStructure for StaticStructure {
    fn key(&self) -> String {
        self.path.clone()
    }

    fn label(&self) -> &str {
        &self.entry.title
    }

    fn scope(&self) -> Option<Scope> {
        Some(self.entry.scope)
    }

    fn storage_pids(&self) -> Vec<i64> {
        self.entry.storage_pids.clone()
    }

    fn icon(&self) -> Option<&str> {
        self.entry.icon.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureDefinition {
    Database(DatabaseStructure),
    Static(StaticStructure),
}

impl StructureDefinition {
    fn inner(&self) -> &dyn DataStructure {
        match self {
            StructureDefinition::Database(ds) => ds,
            StructureDefinition::Static(ds) => ds,
        }
    }

    pub fn kind(&self) -> StructureKind {
        match self {
            StructureDefinition::Database(_) => StructureKind::Database,
            StructureDefinition::Static(_) => StructureKind::Static,
        }
    }

    pub fn summary(&self) -> StructureSummary {
        StructureSummary {
            key: self.key(),
            kind: self.kind(),
            label: self.label().to_string(),
            scope: self.scope(),
            storage_pids: self.storage_pids(),
            icon: self.icon().map(str::to_string),
        }
    }
}

impl DataStructure for StructureDefinition {
    fn key(&self) -> String {
        self.inner().key()
    }

    fn label(&self) -> &str {
        self.inner().label()
    }

    fn scope(&self) -> Option<Scope> {
        self.inner().scope()
    }

    fn storage_pids(&self) -> Vec<i64> {
        self.inner().storage_pids()
    }

    fn icon(&self) -> Option<&str> {
        self.inner().icon()
    }

    fn sorting_field_value(&self) -> String {
        self.inner().sorting_field_value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Database,
    Static,
}

/// Serializable view of a structure definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub key: String,
    pub kind: StructureKind,
    pub label: String,
    pub scope: Option<Scope>,
    pub storage_pids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Case-insensitive order on the sorting field value
pub fn compare_structures(a: &StructureDefinition, b: &StructureDefinition) -> Ordering {
    a.sorting_field_value()
        .to_lowercase()
        .cmp(&b.sorting_field_value().to_lowercase())
}

/// Stable sort, so equal values keep their discovery order
pub fn sort_structures(structures: &mut [StructureDefinition]) {
    structures.sort_by(compare_structures);
}
