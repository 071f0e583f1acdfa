//! Shared types: errors and scope classification

mod errors;
mod scope;

pub use errors::{RegistryError, Result};
pub use scope::Scope;
