//! In-memory record store backed by JSON tables
//!
//! The document format is a single JSON object mapping table names to arrays
//! of row objects:
//!
//! ```json
//! { "datastructure": [ { "uid": 1, "pid": 10, "title": "Page", "scope": 1 } ] }
//! ```

use crate::storage::{row_int, Condition, RecordStore, Row, SelectQuery};
use crate::types::{RegistryError, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let document: HashMap<String, Vec<Value>> = serde_json::from_str(content)?;
        let store = Self::new();

        for (table, rows) in document {
            for row in rows {
                match row {
                    Value::Object(row) => store.insert(&table, row),
                    other => {
                        return Err(RegistryError::Storage(format!(
                            "Row in table '{}' is not an object: {}",
                            table, other
                        )))
                    }
                }
            }
        }

        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading records from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn insert(&self, table: &str, row: Row) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Number of `select_rows` calls served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn matches(row: &Row, condition: &Condition) -> bool {
        match condition {
            Condition::Eq(column, value) => loose_eq(row.get(column), value),
            Condition::NotEq(column, value) => !loose_eq(row.get(column), value),
            Condition::NotDeleted => !is_truthy(row.get("deleted")),
            Condition::NotVersionPlaceholder { workspace } => {
                let state = row_int(row, "t3ver_state").unwrap_or(0);
                let wsid = row_int(row, "t3ver_wsid").unwrap_or(0);
                state <= 0 || wsid == *workspace
            }
        }
    }

    fn project(row: &Row, columns: &[String]) -> Row {
        if columns.is_empty() || columns.iter().any(|c| c == "*") {
            return row.clone();
        }

        columns
            .iter()
            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

impl RecordStore for MemoryStore {
    fn select_rows(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read();
        let Some(rows) = tables.get(&query.table) else {
            debug!("Table '{}' is empty", query.table);
            return Ok(Vec::new());
        };

        let mut seen_groups = HashSet::new();
        let mut result = Vec::new();

        for row in rows {
            if !query.conditions.iter().all(|c| Self::matches(row, c)) {
                continue;
            }

            if let Some(group) = &query.group_by {
                let group_key = row.get(group).map(value_key).unwrap_or_default();
                if !seen_groups.insert(group_key) {
                    continue;
                }
            }

            result.push(Self::project(row, &query.columns));
        }

        debug!(
            "Selected {} row(s) from '{}' with {} condition(s)",
            result.len(),
            query.table,
            query.conditions.len()
        );

        Ok(result)
    }
}

fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Column comparison that treats `5` and `"5"` as equal
fn loose_eq(actual: Option<&Value>, expected: &Value) -> bool {
    let actual = actual.unwrap_or(&Value::Null);
    if actual == expected {
        return true;
    }

    match (as_int(actual), as_int(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        Some(_) => true,
    }
}
