//! Aggregation of static and persisted data structures
//!
//! Every listing merges the static entries with persisted records, drops
//! duplicate identities (first occurrence wins) and sorts the result
//! case-insensitively. Static entries are collected before records, so equal
//! sort values list static structures first.

use crate::config::{ConfigRegistry, ConfigurationMerger, FeatureConfig, StaticConfigEntry};
use crate::storage::{
    Condition, FileSystem, RecordStore, Row, SelectQuery, DATASTRUCTURE_TABLE,
    TEMPLATE_OBJECT_TABLE,
};
use crate::structure::{sort_structures, DataStructure, StructureDefinition, StructureResolver};
use crate::types::{Result, Scope};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
struct Filter {
    pid: Option<i64>,
    scope: Option<Scope>,
}

pub struct AggregationService {
    merger: Arc<ConfigurationMerger>,
    resolver: StructureResolver,
    store: Arc<dyn RecordStore>,
    settings: Arc<dyn FeatureConfig>,
    workspace: i64,
}

impl AggregationService {
    pub fn new(
        registry: Arc<ConfigRegistry>,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn RecordStore>,
        settings: Arc<dyn FeatureConfig>,
    ) -> Self {
        let merger = Arc::new(ConfigurationMerger::new(
            registry,
            Arc::clone(&fs),
            Arc::clone(&settings),
        ));
        let resolver = StructureResolver::new(Arc::clone(&merger), Arc::clone(&store), fs);

        Self {
            merger,
            resolver,
            store,
            settings,
            workspace: 0,
        }
    }

    /// Versioning workspace whose placeholders stay visible
    pub fn with_workspace(mut self, workspace: i64) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn merger(&self) -> &ConfigurationMerger {
        &self.merger
    }

    /// Structures offered at a storage location
    pub fn by_location(&self, pid: i64) -> Result<Vec<StructureDefinition>> {
        self.collect(Filter {
            pid: Some(pid),
            scope: None,
        })
    }

    pub fn by_location_and_scope(&self, pid: i64, scope: Scope) -> Result<Vec<StructureDefinition>> {
        self.collect(Filter {
            pid: Some(pid),
            scope: Some(scope),
        })
    }

    /// Structures of one scope, irrespective of location
    pub fn by_scope(&self, scope: Scope) -> Result<Vec<StructureDefinition>> {
        self.collect(Filter {
            pid: None,
            scope: Some(scope),
        })
    }

    pub fn all(&self) -> Result<Vec<StructureDefinition>> {
        self.collect(Filter::default())
    }

    /// Number of distinct structures referenced by template objects at `pid`
    pub fn count_for_location(&self, pid: i64) -> Result<usize> {
        let query = SelectQuery::new(TEMPLATE_OBJECT_TABLE, &["datastructure"])
            .eq("pid", pid)
            .filter(Condition::NotDeleted)
            .group_by("datastructure");

        let referenced: HashSet<String> = self
            .store
            .select_rows(&query)?
            .iter()
            .filter_map(|row| match row.get("datastructure") {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .collect();

        debug!("Location {} references {} structure(s)", pid, referenced.len());
        Ok(referenced.len())
    }

    pub fn resolve(&self, token: &str) -> Result<StructureDefinition> {
        self.resolver.resolve(token)
    }

    /// The merged static configuration
    pub fn static_configuration(&self) -> Result<Vec<StaticConfigEntry>> {
        self.merger.entries()
    }

    fn collect(&self, filter: Filter) -> Result<Vec<StructureDefinition>> {
        let settings = self.settings.static_ds();
        let mut collection = Vec::new();

        for entry in self.merger.entries()? {
            if filter.scope.is_some_and(|scope| entry.scope != scope) {
                continue;
            }
            if filter.pid.is_some_and(|pid| !entry.applies_to(pid)) {
                continue;
            }
            match self.resolver.resolve_entry(&entry) {
                Some(ds) => collection.push(ds),
                None => debug!("Static structure {} is not resolvable", entry.path),
            }
        }

        if settings.skips_database() {
            debug!("Static-only mode, not querying persisted structures");
        } else {
            for row in self.records(filter)? {
                if let Some(ds) = self.resolver.resolve_record(&row) {
                    collection.push(ds);
                }
            }
        }

        // Uids and paths live in separate key spaces
        let mut seen = HashSet::new();
        collection.retain(|ds| seen.insert((ds.kind(), ds.key())));
        sort_structures(&mut collection);

        info!(
            "Collected {} structure(s) (pid: {:?}, scope: {:?})",
            collection.len(),
            filter.pid,
            filter.scope
        );
        Ok(collection)
    }

    fn records(&self, filter: Filter) -> Result<Vec<Row>> {
        let mut query = SelectQuery::new(DATASTRUCTURE_TABLE, &["*"]);

        if let Some(pid) = filter.pid {
            query = query.eq("pid", pid);
        }

        let query = query
            .filter(Condition::NotDeleted)
            .not_eq("pid", -1)
            .filter(Condition::NotVersionPlaceholder {
                workspace: self.workspace,
            });

        let rows = self.store.select_rows(&query)?;

        // Scope is matched here so codes and names ("fce") compare alike
        Ok(match filter.scope {
            Some(scope) => rows
                .into_iter()
                .filter(|row| row.get("scope").and_then(Scope::from_value) == Some(scope))
                .collect(),
            None => rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticDsSettings;
    use crate::storage::{LocalFileSystem, MemoryStore};
    use crate::types::RegistryError;
    use std::fs;
    use tempfile::TempDir;

    const RECORDS: &str = r#"{
        "datastructure": [
            { "uid": 1, "pid": 10, "title": "page Layout", "scope": 1 },
            { "uid": 2, "pid": 10, "title": "Banner", "scope": 2 },
            { "uid": 3, "pid": 20, "title": "Archive", "scope": 1 },
            { "uid": 4, "pid": 10, "title": "Trashed", "scope": 1, "deleted": 1 },
            { "uid": 5, "pid": 10, "title": "Draft", "scope": 2, "t3ver_state": 1, "t3ver_wsid": 3 },
            { "uid": 6, "pid": -1, "title": "Offline copy", "scope": 1 }
        ],
        "template_object": [
            { "uid": 1, "pid": 10, "datastructure": 1 },
            { "uid": 2, "pid": 10, "datastructure": 1 },
            { "uid": 3, "pid": 10, "datastructure": "ds/fce/teaser.xml" },
            { "uid": 4, "pid": 10, "datastructure": 2, "deleted": 1 },
            { "uid": 5, "pid": 20, "datastructure": 3 }
        ]
    }"#;

    struct Fixture {
        _root: TempDir,
        store: Arc<MemoryStore>,
        service: AggregationService,
    }

    fn fixture(settings: StaticDsSettings) -> Fixture {
        let root = TempDir::new().unwrap();
        for file in ["ds/fce/teaser.xml", "ds/fce/Accordion.xml", "ds/page/Wide.xml"] {
            let path = root.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<T3DataStructure/>").unwrap();
        }

        let registry = Arc::new(ConfigRegistry::new());
        registry.register_entry(
            &StaticConfigEntry::new("ds/legacy/footer.xml", "footer", Scope::Page)
                .with_storage_pids(vec![20]),
        );

        let store = Arc::new(MemoryStore::from_json(RECORDS).unwrap());
        let service = AggregationService::new(
            registry,
            Arc::new(LocalFileSystem::new(root.path())),
            store.clone(),
            Arc::new(settings),
        );

        Fixture {
            _root: root,
            store,
            service,
        }
    }

    fn mixed() -> StaticDsSettings {
        StaticDsSettings {
            enable: true,
            path_fce: "ds/fce".to_string(),
            path_page: "ds/page".to_string(),
            static_only: false,
        }
    }

    fn keys(list: &[StructureDefinition]) -> Vec<String> {
        list.iter().map(|d| d.key()).collect()
    }

    #[test]
    fn test_by_location_merges_sources_sorted() {
        let fx = fixture(mixed());
        let list = fx.service.by_location(10).unwrap();

        assert_eq!(
            keys(&list),
            vec![
                "ds/fce/Accordion.xml",
                "2",
                "1",
                "ds/fce/teaser.xml",
                "ds/page/Wide.xml",
            ]
        );
    }

    #[test]
    fn test_by_location_respects_storage_pids() {
        let fx = fixture(mixed());
        let list = fx.service.by_location(20).unwrap();
        let keys = keys(&list);

        assert!(keys.contains(&"ds/legacy/footer.xml".to_string()));
        assert!(keys.contains(&"3".to_string()));
        assert!(!keys.contains(&"1".to_string()));
    }

    #[test]
    fn test_by_location_and_scope() {
        let fx = fixture(mixed());
        let list = fx.service.by_location_and_scope(10, Scope::Fce).unwrap();

        assert_eq!(keys(&list), vec!["ds/fce/Accordion.xml", "2", "ds/fce/teaser.xml"]);
        assert!(list.iter().all(|d| d.scope() == Some(Scope::Fce)));
    }

    #[test]
    fn test_by_scope_ignores_location() {
        let fx = fixture(mixed());
        let list = fx.service.by_scope(Scope::Page).unwrap();

        assert_eq!(
            keys(&list),
            vec!["3", "ds/legacy/footer.xml", "1", "ds/page/Wide.xml"]
        );
        assert!(list.iter().all(|d| d.scope() == Some(Scope::Page)));
    }

    #[test]
    fn test_all_excludes_deleted_offline_and_placeholders() {
        let fx = fixture(mixed());
        let keys = keys(&fx.service.all().unwrap());

        assert_eq!(keys.len(), 7);
        for hidden in ["4", "5", "6"] {
            assert!(!keys.contains(&hidden.to_string()), "{} should be hidden", hidden);
        }
    }

    #[test]
    fn test_placeholder_visible_in_its_workspace() {
        let fx = fixture(mixed());
        let service = fx.service.with_workspace(3);
        let keys = keys(&service.by_location(10).unwrap());
        assert!(keys.contains(&"5".to_string()));
    }

    #[test]
    fn test_static_only_skips_database() {
        let fx = fixture(StaticDsSettings {
            static_only: true,
            ..mixed()
        });

        let list = fx.service.all().unwrap();
        assert!(list
            .iter()
            .all(|d| matches!(d, StructureDefinition::Static(_))));
        assert_eq!(list.len(), 4);
        assert_eq!(fx.store.query_count(), 0);
    }

    #[test]
    fn test_disabled_static_mode_lists_registered_entries_only() {
        let fx = fixture(StaticDsSettings::default());
        let keys = keys(&fx.service.all().unwrap());

        assert_eq!(keys, vec!["3", "2", "ds/legacy/footer.xml", "1"]);
        assert_eq!(fx.service.merger().scan_count(), 0);
    }

    #[test]
    fn test_no_duplicate_identities() {
        let fx = fixture(mixed());
        fx.service.merger().registry().register_entry(&StaticConfigEntry::new(
            "ds/fce/./teaser.xml",
            "teaser",
            Scope::Fce,
        ));
        fx.service.merger().registry().register_legacy(
            StaticConfigEntry::new("ds/fce/teaser.xml", "Teaser (legacy)", Scope::Fce).to_raw(),
        );

        let list = fx.service.by_location(10).unwrap();
        let keys = keys(&list);
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let fx = fixture(mixed());
        let list = fx.service.by_location(10).unwrap();
        let values: Vec<String> = list
            .iter()
            .map(|d| d.sorting_field_value().to_lowercase())
            .collect();

        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_scan_runs_once_across_queries() {
        let fx = fixture(mixed());
        fx.service.by_location(10).unwrap();
        fx.service.by_scope(Scope::Fce).unwrap();
        fx.service.all().unwrap();

        assert_eq!(fx.service.merger().scan_count(), 1);
    }

    #[test]
    fn test_numeric_static_path_does_not_hide_record() {
        let fx = fixture(mixed());
        fx.service
            .merger()
            .registry()
            .register_entry(&StaticConfigEntry::new("1", "Numeric file", Scope::Page));

        let list = fx.service.by_location(10).unwrap();
        let ones: Vec<&StructureDefinition> = list.iter().filter(|d| d.key() == "1").collect();

        assert_eq!(ones.len(), 2);
        assert!(ones
            .iter()
            .any(|d| matches!(d, StructureDefinition::Database(_))));
        assert!(ones.iter().any(|d| matches!(d, StructureDefinition::Static(_))));
    }

    #[test]
    fn test_scope_names_in_rows_match_scope_filters() {
        let fx = fixture(mixed());
        let row = serde_json::json!({ "uid": 7, "pid": 10, "title": "Zeta", "scope": "fce" });
        fx.store
            .insert(DATASTRUCTURE_TABLE, row.as_object().unwrap().clone());

        let all = keys(&fx.service.all().unwrap());
        let by_scope = keys(&fx.service.by_scope(Scope::Fce).unwrap());
        let by_both = keys(&fx.service.by_location_and_scope(10, Scope::Fce).unwrap());
        let pages = keys(&fx.service.by_scope(Scope::Page).unwrap());

        assert!(all.contains(&"7".to_string()));
        assert!(by_scope.contains(&"7".to_string()));
        assert!(by_both.contains(&"7".to_string()));
        assert!(!pages.contains(&"7".to_string()));
    }

    #[test]
    fn test_count_for_location() {
        let fx = fixture(mixed());
        assert_eq!(fx.service.count_for_location(10).unwrap(), 2);
        assert_eq!(fx.service.count_for_location(20).unwrap(), 1);
        assert_eq!(fx.service.count_for_location(99).unwrap(), 0);
    }

    #[test]
    fn test_empty_results_are_ok() {
        let fx = fixture(StaticDsSettings::default());
        assert!(fx.service.by_location(99).unwrap().is_empty());
        assert!(fx
            .service
            .by_location_and_scope(20, Scope::Fce)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_resolve_delegates() {
        let fx = fixture(mixed());
        assert_eq!(fx.service.resolve("2").unwrap().label(), "Banner");
        assert_eq!(
            fx.service.resolve("ds/fce/teaser.xml").unwrap().key(),
            "ds/fce/teaser.xml"
        );
        assert!(matches!(
            fx.service.resolve("nonexistent.xml"),
            Err(RegistryError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_static_configuration() {
        let fx = fixture(mixed());
        let entries = fx.service.static_configuration().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].path, "ds/legacy/footer.xml");
    }
}
