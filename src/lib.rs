//! dsregistry - data structure resolution and aggregation
//!
//! Lists the data structures available for flexible content templates. A
//! structure is either a persisted record (identified by uid) or a static
//! file found below configured directories (identified by its path). The
//! [`AggregationService`] merges both sources, drops duplicates and returns
//! case-insensitively sorted listings.

pub mod config;
pub mod rpc;
pub mod service;
pub mod storage;
pub mod structure;
pub mod types;

pub use config::{ConfigLoader, ConfigRegistry, StaticConfigEntry, StaticDsSettings};
pub use rpc::QueryServer;
pub use service::AggregationService;
pub use structure::{DataStructure, StructureDefinition, StructureResolver};
pub use types::{RegistryError, Scope};
