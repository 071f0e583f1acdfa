//! Collaborator interfaces for persisted records and the site filesystem

mod filesystem;
mod memory;

pub use filesystem::{FileSystem, LocalFileSystem};
pub use memory::MemoryStore;

use crate::types::Result;
use serde_json::{Map, Value};

/// Table holding persisted data structures
pub const DATASTRUCTURE_TABLE: &str = "datastructure";

/// Table holding template objects, each referencing one data structure
pub const TEMPLATE_OBJECT_TABLE: &str = "template_object";

/// A single row as returned by a record store
pub type Row = Map<String, Value>;

/// Where-clause fragment understood by every record store
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    NotEq(String, Value),
    /// Excludes soft-deleted rows (`deleted` set)
    NotDeleted,
    /// Excludes version placeholders that do not belong to `workspace`
    NotVersionPlaceholder { workspace: i64 },
}

/// Row selection request
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub columns: Vec<String>,
    pub table: String,
    pub conditions: Vec<Condition>,
    pub group_by: Option<String>,
}

impl SelectQuery {
    pub fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            table: table.to_string(),
            conditions: Vec::new(),
            group_by: None,
        }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Condition::Eq(column.to_string(), value.into()))
    }

    pub fn not_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Condition::NotEq(column.to_string(), value.into()))
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }
}

/// Read access to persisted records
pub trait RecordStore: Send + Sync {
    fn select_rows(&self, query: &SelectQuery) -> Result<Vec<Row>>;
}

/// Reads an integer column leniently (numbers or numeric strings)
pub fn row_int(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn row_str(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
