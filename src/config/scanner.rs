//! Directory scanner for static structure files
//!
//! Walks the configured fce and page directories and turns every `.xml` file
//! into a [`StaticConfigEntry`]. When both settings point at the same
//! directory, the scope comes from a `(fce)` marker in the file name instead.

use crate::config::entry::StaticConfigEntry;
use crate::config::registry::ConfigRegistry;
use crate::config::settings::StaticDsSettings;
use crate::storage::FileSystem;
use crate::types::{Result, Scope};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const STRUCTURE_EXTENSION: &str = "xml";
const ICON_EXTENSION: &str = "gif";
const FCE_MARKER: &str = "(fce)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirKind {
    Fce,
    Page,
}

pub struct StaticConfigScanner {
    fs: Arc<dyn FileSystem>,
}

impl StaticConfigScanner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Discover all structure files below the configured directories
    pub fn scan(&self, settings: &StaticDsSettings) -> Result<Vec<StaticConfigEntry>> {
        let directories = self.directories(settings);
        let shared = directories.len() == 1;
        let mut entries = Vec::new();

        for (kind, dir) in directories {
            let Some(dir) = dir else {
                continue;
            };

            let files = self.fs.list_files(&dir, STRUCTURE_EXTENSION, true)?;
            debug!("Found {} structure file(s) in {}", files.len(), dir.display());

            for file in files {
                let dir_kind = if shared { None } else { Some(kind) };
                if let Some(entry) = self.entry_for(&file, dir_kind) {
                    entries.push(entry);
                }
            }
        }

        info!("Scanned {} static structure file(s)", entries.len());
        Ok(entries)
    }

    /// Scan and register every discovered entry in the current list
    pub fn scan_into(&self, settings: &StaticDsSettings, registry: &ConfigRegistry) -> Result<usize> {
        let entries = self.scan(settings)?;
        for entry in &entries {
            registry.register_entry(entry);
        }
        Ok(entries.len())
    }

    /// Configured directories with duplicates removed
    ///
    /// Unresolvable directories are kept (as `None`) so that two distinct but
    /// broken settings still count as two directories.
    fn directories(&self, settings: &StaticDsSettings) -> Vec<(DirKind, Option<PathBuf>)> {
        let mut seen: Vec<(String, Option<PathBuf>)> = Vec::new();
        let mut directories = Vec::new();

        for (kind, raw) in [(DirKind::Fce, &settings.path_fce), (DirKind::Page, &settings.path_page)] {
            let resolved = self.fs.absolute_path(raw);
            if resolved.is_none() {
                debug!("Static structure directory '{}' cannot be resolved", raw);
            }

            let duplicate = seen.iter().any(|(seen_raw, seen_path)| {
                seen_raw == raw || (resolved.is_some() && seen_path == &resolved)
            });
            if duplicate {
                continue;
            }

            seen.push((raw.clone(), resolved.clone()));
            directories.push((kind, resolved));
        }

        directories
    }

    fn entry_for(&self, file: &Path, dir_kind: Option<DirKind>) -> Option<StaticConfigEntry> {
        let Some(path) = self.fs.site_relative(file) else {
            debug!("Skipping file outside site root: {}", file.display());
            return None;
        };

        // A dot file such as `.xml` has its whole name as stem
        let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned());
        let title = stem.clone().unwrap_or_else(|| path.clone());

        let marked_fce = stem.as_deref().is_some_and(|s| s.contains(FCE_MARKER));
        let scope = if dir_kind == Some(DirKind::Fce) || marked_fce {
            Scope::Fce
        } else {
            Scope::Page
        };

        let mut entry = StaticConfigEntry::new(path, title, scope);

        if let Some(stem) = &stem {
            let icon = file.with_file_name(format!("{}.{}", stem, ICON_EXTENSION));
            if self.fs.file_exists(&icon) {
                if let Some(icon) = self.fs.site_relative(&icon) {
                    entry = entry.with_icon(icon);
                }
            }
        }

        debug!("Discovered static structure {} as {}", entry.path, entry.scope);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[&str]) -> TempDir {
        let root = TempDir::new().unwrap();
        for file in files {
            let path = root.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<T3DataStructure/>").unwrap();
        }
        root
    }

    fn settings(fce: &str, page: &str) -> StaticDsSettings {
        StaticDsSettings {
            enable: true,
            path_fce: fce.to_string(),
            path_page: page.to_string(),
            static_only: true,
        }
    }

    fn scanner(root: &TempDir) -> StaticConfigScanner {
        StaticConfigScanner::new(Arc::new(LocalFileSystem::new(root.path())))
    }

    fn scope_of(entries: &[StaticConfigEntry], path: &str) -> Option<Scope> {
        entries.iter().find(|e| e.path == path).map(|e| e.scope)
    }

    #[test]
    fn test_classifies_by_directory() {
        let root = site(&["ds/fce/teaser.xml", "ds/page/main.xml", "ds/page/sub/wide.xml"]);
        let entries = scanner(&root).scan(&settings("ds/fce/", "ds/page/")).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(scope_of(&entries, "ds/fce/teaser.xml"), Some(Scope::Fce));
        assert_eq!(scope_of(&entries, "ds/page/main.xml"), Some(Scope::Page));
        assert_eq!(scope_of(&entries, "ds/page/sub/wide.xml"), Some(Scope::Page));
    }

    #[test]
    fn test_classifies_by_marker_in_shared_directory() {
        let root = site(&["ds/header(fce).xml", "ds/header.xml"]);
        let entries = scanner(&root).scan(&settings("ds/", "ds")).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(scope_of(&entries, "ds/header(fce).xml"), Some(Scope::Fce));
        assert_eq!(scope_of(&entries, "ds/header.xml"), Some(Scope::Page));
    }

    #[test]
    fn test_title_and_icon() {
        let root = site(&["ds/fce/teaser.xml", "ds/fce/plain.xml"]);
        fs::write(root.path().join("ds/fce/teaser.gif"), "GIF89a").unwrap();

        let entries = scanner(&root).scan(&settings("ds/fce", "ds/page")).unwrap();
        let teaser = entries.iter().find(|e| e.title == "teaser").unwrap();
        let plain = entries.iter().find(|e| e.title == "plain").unwrap();

        assert_eq!(teaser.icon.as_deref(), Some("ds/fce/teaser.gif"));
        assert_eq!(plain.icon, None);
        assert!(teaser.storage_pids.is_empty());
    }

    /// Lists a fixed set of files regardless of the directory asked for
    struct FixedListing {
        inner: LocalFileSystem,
        files: Vec<PathBuf>,
    }

    impl FileSystem for FixedListing {
        fn absolute_path(&self, path: &str) -> Option<PathBuf> {
            self.inner.absolute_path(path)
        }

        fn list_files(&self, _dir: &Path, _extension: &str, _recursive: bool) -> Result<Vec<PathBuf>> {
            Ok(self.files.clone())
        }

        fn file_exists(&self, _path: &Path) -> bool {
            false
        }

        fn site_relative(&self, path: &Path) -> Option<String> {
            self.inner.site_relative(path)
        }
    }

    #[test]
    fn test_nameless_file_degrades_to_file_name_and_page() {
        let fs = FixedListing {
            inner: LocalFileSystem::new("/srv/site"),
            files: vec![
                PathBuf::from("/srv/site/ds/.xml"),
                PathBuf::from("/srv/site/ds/header(fce).xml"),
            ],
        };
        let scanner = StaticConfigScanner::new(Arc::new(fs));

        let entries = scanner.scan(&settings("ds", "ds")).unwrap();
        assert_eq!(entries.len(), 2);

        let dotted = entries.iter().find(|e| e.path == "ds/.xml").unwrap();
        assert_eq!(dotted.title, ".xml");
        assert_eq!(dotted.scope, Scope::Page);
        assert_eq!(dotted.icon, None);

        assert_eq!(scope_of(&entries, "ds/header(fce).xml"), Some(Scope::Fce));
    }

    #[test]
    fn test_missing_directories_yield_nothing() {
        let root = site(&[]);
        let entries = scanner(&root).scan(&settings("nope/fce", "nope/page")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_scan_into_registers_current_entries() {
        let root = site(&["ds/fce/a.xml", "ds/page/b.xml"]);
        let registry = ConfigRegistry::new();

        let count = scanner(&root)
            .scan_into(&settings("ds/fce", "ds/page"), &registry)
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.current_entries().len(), 2);
        assert!(registry.legacy_entries().is_empty());
    }
}
