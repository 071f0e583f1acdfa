//! Feature toggles for static structure support

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticDsSettings {
    /// Scan the configured directories for structure files
    pub enable: bool,
    /// Directory holding flexible content element structures
    pub path_fce: String,
    /// Directory holding page template structures
    pub path_page: String,
    /// With `enable`, stop consulting persisted records in list queries
    pub static_only: bool,
}

impl Default for StaticDsSettings {
    fn default() -> Self {
        Self {
            enable: false,
            path_fce: "fileadmin/templates/ds/fce/".to_string(),
            path_page: "fileadmin/templates/ds/page/".to_string(),
            static_only: true,
        }
    }
}

impl StaticDsSettings {
    pub fn skips_database(&self) -> bool {
        self.enable && self.static_only
    }
}

/// Source of the static structure toggles, read once per call
pub trait FeatureConfig: Send + Sync {
    fn static_ds(&self) -> StaticDsSettings;
}

impl FeatureConfig for StaticDsSettings {
    fn static_ds(&self) -> StaticDsSettings {
        self.clone()
    }
}

/// Toggles that may be changed while the service is running
impl FeatureConfig for RwLock<StaticDsSettings> {
    fn static_ds(&self) -> StaticDsSettings {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_database_needs_both_toggles() {
        let mut settings = StaticDsSettings::default();
        assert!(!settings.skips_database());

        settings.enable = true;
        assert!(settings.skips_database());

        settings.static_only = false;
        assert!(!settings.skips_database());
    }

    #[test]
    fn test_runtime_toggle() {
        let settings = RwLock::new(StaticDsSettings::default());
        assert!(!settings.static_ds().enable);

        settings.write().enable = true;
        assert!(settings.static_ds().enable);
    }
}
