//! Schema Explorer Library
//!
//! Explore the relational schema behind an entity-oriented application:
//! catalog tables and the entity types that own them, derive the table
//! relationship graph, search names and values, and run read-only queries.
//! The [`mcp`] and [`transport`] modules expose these as MCP tools.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod explorer;
pub mod mcp;
pub mod metadata;
pub mod models;
pub mod search;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{ExplorerError, ExplorerResult};
pub use explorer::Explorer;
pub use mcp::ExplorerService;
