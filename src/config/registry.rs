//! Injectable registry of externally supplied static structure entries
//!
//! Collectors (configuration files, the directory scanner, embedding
//! applications) write raw entries here; the merger reads them back.

use crate::config::entry::{RawEntry, StaticConfigEntry};
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ConfigRegistry {
    /// Legacy extension-point list, read first
    legacy: RwLock<Vec<RawEntry>>,
    /// Current configuration list, read second so its entries win
    current: RwLock<Vec<RawEntry>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_legacy(&self, entry: RawEntry) {
        debug!("Registering legacy static structure entry");
        self.legacy.write().push(entry);
    }

    pub fn register(&self, entry: RawEntry) {
        self.current.write().push(entry);
    }

    pub fn register_entry(&self, entry: &StaticConfigEntry) {
        debug!("Registering static structure: {} ({})", entry.path, entry.scope);
        self.register(entry.to_raw());
    }

    pub fn legacy_entries(&self) -> Vec<RawEntry> {
        self.legacy.read().clone()
    }

    pub fn current_entries(&self) -> Vec<RawEntry> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.legacy.read().len() + self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scope;

    #[test]
    fn test_lists_are_kept_apart() {
        let registry = ConfigRegistry::new();
        assert!(registry.is_empty());

        let entry = StaticConfigEntry::new("fileadmin/ds/a.xml", "A", Scope::Page);
        registry.register_legacy(entry.to_raw());
        registry.register_entry(&entry);
        registry.register_entry(&entry);

        assert_eq!(registry.legacy_entries().len(), 1);
        assert_eq!(registry.current_entries().len(), 2);
        assert_eq!(registry.len(), 3);
    }
}
