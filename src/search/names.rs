//! Table and column name search.

use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{Catalog, ColumnMatch, SearchResult};

/// Find tables and columns whose names contain `term`, ignoring case.
///
/// A table whose name matches is reported once with all of its columns and its
/// columns are not inspected further. Otherwise the table is reported only if
/// some of its column names match. Declared tables missing from the database
/// are not reported.
pub fn search_by_field_name(catalog: &Catalog, term: &str) -> ExplorerResult<Vec<SearchResult>> {
    if term.is_empty() {
        return Err(ExplorerError::invalid_input("Search term cannot be empty"));
    }
    let needle = term.to_lowercase();

    let mut results = Vec::new();
    for table in catalog.tables.values().filter(|t| t.exists) {
        if table.name.to_lowercase().contains(&needle) {
            results.push(SearchResult::Table {
                name: table.name.clone(),
                columns: table.columns.iter().map(ColumnMatch::from).collect(),
            });
            continue;
        }

        let columns: Vec<ColumnMatch> = table
            .columns
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .map(ColumnMatch::from)
            .collect();
        if !columns.is_empty() {
            results.push(SearchResult::Columns {
                table: table.name.clone(),
                columns,
            });
        }
    }

    tracing::debug!(term = %term, results = results.len(), "Name search finished");
    Ok(results)
}
