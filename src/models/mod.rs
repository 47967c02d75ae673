//! Data models for the schema explorer.
//!
//! These are plain data structures produced by the catalog, graph, search and
//! query components and consumed read-only by the MCP layer.

pub mod catalog;
pub mod graph;
pub mod query;
pub mod search;

// Re-export commonly used types
pub use catalog::{
    Catalog, Column, EntityType, FieldStorage, FieldTables, Table, TableKind, is_string_like_type,
};
pub use graph::{EdgeKind, RelationshipEdge, RelationshipGraph, RelationshipNode};
pub use query::{
    ColumnMetadata, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_QUERY_TIMEOUT_SECS,
    MAX_ROW_LIMIT, QueryRequest, QueryResult,
};
pub use search::{ColumnMatch, Row, SearchResult, ValueSearchReport};
