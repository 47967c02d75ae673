//! Query execution tool.
//!
//! This module implements the `query` MCP tool for executing SELECT queries.
//! Anything that does not start with SELECT or mentions a write keyword is
//! rejected before it reaches the database.

use crate::error::ExplorerResult;
use crate::explorer::Explorer;
use crate::models::{ColumnMetadata, MAX_ROW_LIMIT, QueryRequest, QueryResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL SELECT statement to execute. Statements containing DROP, DELETE, UPDATE,
    /// INSERT, ALTER, CREATE or TRUNCATE are rejected.
    pub sql: String,
    /// Maximum rows to return. Default: 100, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
    /// Query timeout in seconds. Default: server setting (30), max: 300
    #[serde(default)]
    pub timeout_secs: Option<u32>,
}

impl From<QueryInput> for QueryRequest {
    fn from(input: QueryInput) -> Self {
        Self {
            sql: input.sql,
            limit: input.limit,
            timeout_secs: input.timeout_secs,
        }
    }
}

/// Output from the query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutput {
    /// Column metadata (name, type)
    pub columns: Vec<ColumnMetadataOutput>,
    /// Query result rows as key-value maps
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// True if result was truncated due to limit
    pub truncated: bool,
    /// Number of rows returned
    pub row_count: usize,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
    /// Warning message if any issues occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnMetadataOutput {
    pub name: String,
    pub type_name: String,
}

impl From<ColumnMetadata> for ColumnMetadataOutput {
    fn from(meta: ColumnMetadata) -> Self {
        Self {
            name: meta.name,
            type_name: meta.type_name,
        }
    }
}

impl QueryOutput {
    pub fn from_result(result: QueryResult, truncated: bool, warning: Option<String>) -> Self {
        Self {
            columns: result.columns.into_iter().map(Into::into).collect(),
            row_count: result.rows.len(),
            rows: result.rows,
            truncated,
            execution_time_ms: result.execution_time_ms,
            warning,
        }
    }
}

/// Warning reported when the requested limit exceeds the maximum.
pub(crate) fn limit_warning(requested: Option<u32>) -> Option<String> {
    requested.filter(|l| *l > MAX_ROW_LIMIT).map(|l| {
        format!(
            "Requested limit {} exceeds maximum allowed ({}). Results capped to {} rows.",
            l, MAX_ROW_LIMIT, MAX_ROW_LIMIT
        )
    })
}

/// Handler for query execution.
pub struct QueryToolHandler {
    explorer: Arc<Explorer>,
}

impl QueryToolHandler {
    pub fn new(explorer: Arc<Explorer>) -> Self {
        Self { explorer }
    }

    /// Handle the query tool call.
    pub async fn query(&self, input: QueryInput) -> ExplorerResult<QueryOutput> {
        let warning = limit_warning(input.limit);
        let request = QueryRequest::from(input);
        let (result, truncated) = self.explorer.query(&request).await?;
        Ok(QueryOutput::from_result(result, truncated, warning))
    }
}
