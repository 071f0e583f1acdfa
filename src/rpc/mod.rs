//! JSON-RPC query server exposing the aggregation service as tools

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::QueryServer;
