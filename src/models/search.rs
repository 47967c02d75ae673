//! Search result models.

use crate::models::Column;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub type Row = serde_json::Map<String, JsonValue>;

/// Column summary reported by name searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMatch {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl From<&Column> for ColumnMatch {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
        }
    }
}

/// One entry of a value or name search.
///
/// A table produces at most one entry per search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchResult {
    /// Rows of `table` containing the term
    Value {
        table: String,
        matches: Vec<Row>,
        count: usize,
    },
    /// Table name matched; lists every column
    Table {
        name: String,
        columns: Vec<ColumnMatch>,
    },
    /// Only some column names matched
    Columns {
        table: String,
        columns: Vec<ColumnMatch>,
    },
}

impl SearchResult {
    pub fn table_name(&self) -> &str {
        match self {
            Self::Value { table, .. } => table,
            Self::Table { name, .. } => name,
            Self::Columns { table, .. } => table,
        }
    }
}

/// Outcome of a value search, including bookkeeping about skipped tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSearchReport {
    pub results: Vec<SearchResult>,
    /// Tables whose scan completed (with or without matches)
    pub scanned: usize,
    /// Tables skipped because of an error or timeout
    pub skipped: usize,
    /// True when the overall deadline cut the search short
    pub deadline_expired: bool,
}
