//! Static structure configuration
//!
//! Static entries reach the registry from three origins:
//! 1. The directory scan (current list, once per process)
//! 2. The `structures` list of the config file (current list)
//! 3. The `legacy_structures` list of the config file (legacy list)
//!
//! The merger folds them into one deduplicated set.

mod entry;
mod loader;
mod merger;
mod registry;
mod scanner;
mod settings;
mod user_config;

pub use entry::{RawEntry, StaticConfigEntry};
pub use loader::ConfigLoader;
pub use merger::{ConfigurationMerger, InitGuard};
pub use registry::ConfigRegistry;
pub use scanner::StaticConfigScanner;
pub use settings::{FeatureConfig, StaticDsSettings};
pub use user_config::UserConfig;
