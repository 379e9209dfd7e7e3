//! Core: configuration, shared state and the HTTP server

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::{CATALOG_RESOURCE, ResourceVersions, ServerState};
