//! MCP tool implementations.
//!
//! This module contains all explorer tool handlers:
//! - `get_schema`: Catalog of tables, columns and entity types
//! - `get_relationships`: Table relationship graph
//! - `search`: Value and name search across the catalog
//! - `query`: Execute read-only SELECT queries
//! - `sql_validator`: The read-only query gate

pub mod query;
pub mod relationships;
pub mod schema;
pub mod search;
pub mod sql_validator;

pub use query::{QueryInput, QueryOutput, QueryToolHandler};
pub use relationships::{GetRelationshipsInput, GetRelationshipsOutput, RelationshipToolHandler};
pub use schema::{GetSchemaInput, GetSchemaOutput, SchemaToolHandler};
pub use search::{SearchInput, SearchOutput, SearchToolHandler, SearchType};
