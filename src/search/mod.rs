//! Name and value search across the catalog.

mod names;
pub mod scanner;
mod value;

use crate::config::{
    DEFAULT_SEARCH_DEADLINE_SECS, DEFAULT_SEARCH_ROW_LIMIT, DEFAULT_SEARCH_SKIP_PREFIXES,
    DEFAULT_SEARCH_TABLE_TIMEOUT_SECS, DEFAULT_SEARCH_WORKERS,
};
use std::time::Duration;

pub use names::search_by_field_name;
pub use scanner::{SqlxTableScanner, TableScanner};
pub use value::search_by_value;

/// Tuning for value search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Maximum number of tables scanned at once.
    pub workers: usize,
    /// Time allowed for one table scan before it is skipped.
    pub table_timeout: Duration,
    /// Time allowed for the whole search.
    pub deadline: Duration,
    /// Rows returned per table when the caller gives no limit.
    pub row_limit: u32,
    /// Tables whose names start with any of these are never scanned.
    pub skip_prefixes: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_SEARCH_WORKERS,
            table_timeout: Duration::from_secs(DEFAULT_SEARCH_TABLE_TIMEOUT_SECS),
            deadline: Duration::from_secs(DEFAULT_SEARCH_DEADLINE_SECS),
            row_limit: DEFAULT_SEARCH_ROW_LIMIT,
            skip_prefixes: DEFAULT_SEARCH_SKIP_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}
