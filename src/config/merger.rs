//! Merging of scanned and registered static structure entries
//!
//! The directory scan runs at most once per merger. Every later call only
//! re-reads the registry, so entries registered after the scan still show up.

use crate::config::entry::StaticConfigEntry;
use crate::config::registry::ConfigRegistry;
use crate::config::scanner::StaticConfigScanner;
use crate::config::settings::FeatureConfig;
use crate::storage::FileSystem;
use crate::types::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One-shot initialization guard
///
/// Concurrent callers are serialized; the first successful run closes the
/// guard for good. A failed run leaves it open so the next call retries.
#[derive(Debug, Default)]
pub struct InitGuard {
    complete: AtomicBool,
    lock: Mutex<()>,
}

impl InitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Run `init` unless a previous run succeeded; returns whether it ran
    pub fn run<F>(&self, init: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        if self.is_complete() {
            return Ok(false);
        }

        let _held = self.lock.lock();
        if self.is_complete() {
            return Ok(false);
        }

        init()?;
        self.complete.store(true, Ordering::Release);
        Ok(true)
    }
}

pub struct ConfigurationMerger {
    registry: Arc<ConfigRegistry>,
    scanner: StaticConfigScanner,
    settings: Arc<dyn FeatureConfig>,
    guard: InitGuard,
    scans: AtomicUsize,
}

impl ConfigurationMerger {
    pub fn new(
        registry: Arc<ConfigRegistry>,
        fs: Arc<dyn FileSystem>,
        settings: Arc<dyn FeatureConfig>,
    ) -> Self {
        Self {
            registry,
            scanner: StaticConfigScanner::new(fs),
            settings,
            guard: InitGuard::new(),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.guard.is_complete()
    }

    /// Number of directory scans performed (0 or 1)
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Scan the configured directories if that has not happened yet
    ///
    /// The guard closes even when static structures are disabled, so turning
    /// the toggle on later does not trigger a scan within this process.
    pub fn initialize(&self) -> Result<()> {
        self.guard.run(|| {
            let settings = self.settings.static_ds();
            if settings.enable {
                let count = self.scanner.scan_into(&settings, &self.registry)?;
                self.scans.fetch_add(1, Ordering::SeqCst);
                info!("Registered {} scanned static structure(s)", count);
            } else {
                debug!("Static structures disabled, skipping directory scan");
            }
            Ok(())
        })?;
        Ok(())
    }

    /// The definitive static entries, deduplicated by composite key
    ///
    /// Legacy entries are read before current ones; on a key collision the
    /// later entry replaces the earlier one but keeps its position.
    pub fn entries(&self) -> Result<Vec<StaticConfigEntry>> {
        self.initialize()?;

        let mut merged: Vec<StaticConfigEntry> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0;

        let raw_entries = self
            .registry
            .legacy_entries()
            .into_iter()
            .chain(self.registry.current_entries());

        for raw in raw_entries {
            let entry = match StaticConfigEntry::from_raw(&raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping static structure entry: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            let key = entry.composite_key();
            match positions.get(&key) {
                Some(&index) => merged[index] = entry,
                None => {
                    positions.insert(key, merged.len());
                    merged.push(entry);
                }
            }
        }

        debug!(
            "Merged {} static structure(s), skipped {} malformed",
            merged.len(),
            skipped
        );

        Ok(merged)
    }
}
