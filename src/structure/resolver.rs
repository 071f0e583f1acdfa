//! Token resolution
//!
//! A token is either a positive uid (persisted structure) or a file path that
//! must match one of the merged static entries.

use crate::config::{ConfigurationMerger, StaticConfigEntry};
use crate::storage::{Condition, FileSystem, RecordStore, Row, SelectQuery, DATASTRUCTURE_TABLE};
use crate::structure::{DatabaseStructure, StaticStructure, StructureDefinition, StructureRecord};
use crate::types::{RegistryError, Result};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uid(u64),
    Path(String),
}

impl Token {
    /// Whole-token positive integers are uids, anything else is a path
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(uid) if uid > 0 => Token::Uid(uid),
            _ => Token::Path(trimmed.to_string()),
        }
    }
}

pub struct StructureResolver {
    merger: Arc<ConfigurationMerger>,
    store: Arc<dyn RecordStore>,
    fs: Arc<dyn FileSystem>,
}

impl StructureResolver {
    pub fn new(
        merger: Arc<ConfigurationMerger>,
        store: Arc<dyn RecordStore>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self { merger, store, fs }
    }

    pub fn resolve(&self, token: &str) -> Result<StructureDefinition> {
        match Token::parse(token) {
            Token::Uid(uid) => self.resolve_uid(uid),
            Token::Path(path) => {
                let entries = self.merger.entries()?;
                self.find_static(&path, &entries)
                    .ok_or_else(|| RegistryError::InvalidToken(token.to_string()))
            }
        }
    }

    /// Build a persisted structure, loading its row snapshot
    pub fn resolve_uid(&self, uid: u64) -> Result<StructureDefinition> {
        let query = SelectQuery::new(DATASTRUCTURE_TABLE, &["*"])
            .eq("uid", uid)
            .filter(Condition::NotDeleted);

        let record = self
            .store
            .select_rows(&query)?
            .first()
            .map(StructureRecord::from_row);

        if record.is_none() {
            debug!("Structure {} has no live record", uid);
        }

        Ok(StructureDefinition::Database(DatabaseStructure::new(uid, record)))
    }

    /// Build a persisted structure from a row already fetched by a listing
    pub fn resolve_record(&self, row: &Row) -> Option<StructureDefinition> {
        let uid = crate::storage::row_int(row, "uid").filter(|uid| *uid > 0)?;
        let record = StructureRecord::from_row(row);
        Some(StructureDefinition::Database(DatabaseStructure::new(
            uid as u64,
            Some(record),
        )))
    }

    /// Build a static structure straight from a merged entry
    ///
    /// Returns `None` when the entry path cannot be normalized below the
    /// site root.
    pub fn resolve_entry(&self, entry: &StaticConfigEntry) -> Option<StructureDefinition> {
        let absolute = self.fs.absolute_path(&entry.path)?;
        let path = self.fs.site_relative(&absolute)?;
        Some(StructureDefinition::Static(StaticStructure::new(
            path,
            entry.clone(),
        )))
    }

    /// First merged entry whose normalized path equals the token's
    fn find_static(&self, token: &str, entries: &[StaticConfigEntry]) -> Option<StructureDefinition> {
        let wanted = self.fs.absolute_path(token)?;

        let entry = entries
            .iter()
            .find(|entry| self.fs.absolute_path(&entry.path).as_ref() == Some(&wanted))?;

        debug!("Token '{}' matches static structure {}", token, entry.path);
        self.resolve_entry(entry)
    }
}
