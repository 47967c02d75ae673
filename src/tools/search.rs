//! Search tool.
//!
//! `search` looks for a term either in row values (`type: "value"`) or in
//! table and column names (`type: "field"`).

use crate::error::ExplorerResult;
use crate::explorer::Explorer;
use crate::models::{ColumnMatch, SearchResult};
use crate::tools::query::limit_warning;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Search row values of text-like columns (default)
    #[default]
    Value,
    /// Search table and column names
    Field,
}

/// Input for the search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Term to look for (case-insensitive substring)
    pub term: String,
    /// "value" searches row contents, "field" searches table and column names
    #[serde(default, rename = "type")]
    pub search_type: SearchType,
    /// Maximum matching rows per table for value searches. Default: 50, max: 10000
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Output from the search tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchOutput {
    pub results: Vec<SearchResultOutput>,
    /// Number of result entries
    pub count: usize,
    /// Tables scanned without error (value search only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables_scanned: Option<usize>,
    /// Tables skipped after an error or timeout (value search only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables_skipped: Option<usize>,
    /// Warning message if results are partial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchResultOutput {
    /// "value", "table" or "columns"
    #[serde(rename = "type")]
    pub kind: String,
    pub table: String,
    /// Matching rows (value results)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<serde_json::Map<String, JsonValue>>,
    /// Matching or listed columns (name results)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnMatchOutput>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnMatchOutput {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl From<ColumnMatch> for ColumnMatchOutput {
    fn from(column: ColumnMatch) -> Self {
        Self {
            name: column.name,
            data_type: column.data_type,
        }
    }
}

impl From<SearchResult> for SearchResultOutput {
    fn from(result: SearchResult) -> Self {
        match result {
            SearchResult::Value {
                table,
                matches,
                count,
            } => Self {
                kind: "value".to_string(),
                table,
                matches,
                columns: Vec::new(),
                count,
            },
            SearchResult::Table { name, columns } => Self {
                kind: "table".to_string(),
                table: name,
                matches: Vec::new(),
                count: columns.len(),
                columns: columns.into_iter().map(Into::into).collect(),
            },
            SearchResult::Columns { table, columns } => Self {
                kind: "columns".to_string(),
                table,
                matches: Vec::new(),
                count: columns.len(),
                columns: columns.into_iter().map(Into::into).collect(),
            },
        }
    }
}

fn into_outputs(results: Vec<SearchResult>) -> Vec<SearchResultOutput> {
    results.into_iter().map(Into::into).collect()
}

/// Handler for search requests.
pub struct SearchToolHandler {
    explorer: Arc<Explorer>,
}

impl SearchToolHandler {
    pub fn new(explorer: Arc<Explorer>) -> Self {
        Self { explorer }
    }

    /// Handle the search tool call.
    pub async fn search(&self, input: SearchInput) -> ExplorerResult<SearchOutput> {
        let output = match input.search_type {
            SearchType::Field => {
                let results = into_outputs(self.explorer.search_by_field_name(&input.term).await?);
                SearchOutput {
                    count: results.len(),
                    results,
                    tables_scanned: None,
                    tables_skipped: None,
                    warning: None,
                }
            }
            SearchType::Value => {
                let report = self.explorer.search_by_value(&input.term, input.limit).await?;
                let deadline_warning = report.deadline_expired.then(|| {
                    "Search deadline reached before every table was scanned; results are partial."
                        .to_string()
                });
                let warning = match (limit_warning(input.limit), deadline_warning) {
                    (Some(limit), Some(deadline)) => Some(format!("{} {}", limit, deadline)),
                    (limit, deadline) => limit.or(deadline),
                };
                let results = into_outputs(report.results);
                SearchOutput {
                    count: results.len(),
                    results,
                    tables_scanned: Some(report.scanned),
                    tables_skipped: Some(report.skipped),
                    warning,
                }
            }
        };

        info!(
            term = %input.term,
            search_type = ?input.search_type,
            results = output.count,
            "Search completed"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_input_deserialization() {
        let input: SearchInput = serde_json::from_str(r#"{"term": "needle"}"#).unwrap();
        assert_eq!(input.search_type, SearchType::Value);
        assert!(input.limit.is_none());

        let input: SearchInput =
            serde_json::from_str(r#"{"term": "uid", "type": "field", "limit": 5}"#).unwrap();
        assert_eq!(input.search_type, SearchType::Field);
        assert_eq!(input.limit, Some(5));

        assert!(serde_json::from_str::<SearchInput>(r#"{"term": "x", "type": "regex"}"#).is_err());
    }

    #[test]
    fn test_value_result_output() {
        let mut row = serde_json::Map::new();
        row.insert("title".into(), json!("a needle"));
        let output = SearchResultOutput::from(SearchResult::Value {
            table: "node_field_data".into(),
            matches: vec![row],
            count: 1,
        });
        let json = serde_json::to_value(output).unwrap();
        assert_eq!(json["type"], "value");
        assert_eq!(json["matches"][0]["title"], "a needle");
        assert!(json.get("columns").is_none());
    }

    #[tokio::test]
    async fn test_value_search_limit_is_capped() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO notes (body) VALUES ('haystack needle')")
            .execute(&pool)
            .await
            .unwrap();
        let handler = SearchToolHandler::new(Arc::new(Explorer::new(
            crate::db::DbPool::SQLite(pool),
        )));

        let output = handler
            .search(SearchInput {
                term: "needle".into(),
                search_type: SearchType::Value,
                limit: Some(u32::MAX),
            })
            .await
            .unwrap();
        assert_eq!(output.count, 1);
        assert!(output.warning.unwrap().contains("exceeds maximum"));

        let output = handler
            .search(SearchInput {
                term: "needle".into(),
                search_type: SearchType::Value,
                limit: Some(5),
            })
            .await
            .unwrap();
        assert!(output.warning.is_none());
    }

    #[test]
    fn test_name_result_output() {
        let output = SearchResultOutput::from(SearchResult::Columns {
            table: "users_field_data".into(),
            columns: vec![ColumnMatch {
                name: "uid".into(),
                data_type: "INTEGER".into(),
            }],
        });
        assert_eq!(output.kind, "columns");
        assert_eq!(output.count, 1);
        assert_eq!(output.columns[0].data_type, "INTEGER");
    }
}
