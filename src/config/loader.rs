//! Configuration file discovery
//!
//! Lookup order (first existing file wins):
//! 1. Explicit path given on the command line
//! 2. ./.dsregistry.toml (project-specific)
//! 3. $DSREGISTRY_CONFIG
//! 4. ~/.config/dsregistry/config.toml (user-global)

use crate::config::UserConfig;
use crate::types::RegistryError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct ConfigLoader {
    config: UserConfig,
    source: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(explicit: Option<&Path>) -> Result<Self, RegistryError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RegistryError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        for path in Self::candidates(explicit) {
            if path.exists() {
                let config = Self::load_file(&path)?;
                info!("Loaded configuration from {}", path.display());
                return Ok(Self {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self {
            config: UserConfig::default(),
            source: None,
        })
    }

    fn candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        }

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(".dsregistry.toml"));
        }

        if let Ok(config_path) = std::env::var("DSREGISTRY_CONFIG") {
            candidates.push(PathBuf::from(config_path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("dsregistry").join("config.toml"));
        }

        candidates
    }

    pub fn load_file(path: &Path) -> Result<UserConfig, RegistryError> {
        debug!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<UserConfig, RegistryError> {
        toml::from_str(content)
            .map_err(|e| RegistryError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    /// File the configuration came from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn into_config(self) -> UserConfig {
        self.config
    }
}
