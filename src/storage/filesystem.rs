//! Site filesystem access
//!
//! Every path handed to the service is interpreted relative to a site root.
//! Paths that normalize to a location outside that root are rejected.

use crate::types::Result;
use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub trait FileSystem: Send + Sync {
    /// Resolve a site-relative or absolute path to a normalized absolute path
    fn absolute_path(&self, path: &str) -> Option<PathBuf>;

    /// List files with the given extension below `dir`, sorted by path
    fn list_files(&self, dir: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>>;

    fn file_exists(&self, path: &Path) -> bool;

    /// Express an absolute path relative to the site root, using `/` separators
    fn site_relative(&self, path: &Path) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    site_root: PathBuf,
}

impl LocalFileSystem {
    /// Relative roots are anchored at the current directory
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        let site_root = site_root.into();
        let site_root = if site_root.is_absolute() {
            site_root
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(site_root),
                Err(_) => site_root,
            }
        };

        Self {
            site_root: site_root.clean(),
        }
    }

    pub fn site_root(&self) -> &Path {
        &self.site_root
    }
}

impl FileSystem for LocalFileSystem {
    fn absolute_path(&self, path: &str) -> Option<PathBuf> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }

        let candidate = Path::new(path);
        let resolved = if candidate.is_absolute() {
            candidate.clean()
        } else {
            self.site_root.join(candidate).clean()
        };

        if resolved.starts_with(&self.site_root) {
            Some(resolved)
        } else {
            debug!("Rejecting path outside site root: {}", path);
            None
        }
    }

    fn list_files(&self, dir: &Path, extension: &str, recursive: bool) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            debug!("Directory does not exist: {}", dir.display());
            return Ok(Vec::new());
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));

            if matches {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn site_relative(&self, path: &Path) -> Option<String> {
        let relative = path.clean();
        let relative = relative.strip_prefix(&self.site_root).ok()?;

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Some(parts.join("/"))
    }
}
