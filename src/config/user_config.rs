//! User configuration file parsing

use crate::config::entry::RawEntry;
use crate::config::registry::ConfigRegistry;
use crate::config::settings::StaticDsSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Directory all structure paths are relative to
    pub site_root: Option<PathBuf>,
    /// JSON document with persisted records
    pub records: Option<PathBuf>,
    /// Active versioning workspace
    pub workspace: i64,
    pub static_ds: StaticDsSettings,
    pub legacy_structures: Vec<RawEntry>,
    pub structures: Vec<RawEntry>,
}

impl UserConfig {
    /// Hand the configured entry lists over to the registry
    pub fn register_into(&self, registry: &ConfigRegistry) {
        for entry in &self.legacy_structures {
            registry.register_legacy(entry.clone());
        }
        for entry in &self.structures {
            registry.register(entry.clone());
        }
    }
}
