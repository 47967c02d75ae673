//! Per-table value scans.

use crate::db::types::RowToJson;
use crate::db::{DatabaseType, DbPool};
use crate::error::ExplorerResult;
use crate::models::{Column, Row, Table};
use async_trait::async_trait;

/// Runs one bounded substring scan over a table's string-like columns.
#[async_trait]
pub trait TableScanner: Send + Sync {
    /// Rows of `table` where any string-like column contains `term`
    /// (case-insensitive), at most `limit` rows.
    async fn scan(&self, table: &Table, term: &str, limit: u32) -> ExplorerResult<Vec<Row>>;
}

/// Escape LIKE metacharacters so the term matches literally with `ESCAPE '\'`.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quote an identifier for the given driver, doubling embedded quote characters.
pub fn quote_ident(name: &str, db_type: DatabaseType) -> String {
    let quote = match db_type {
        DatabaseType::MySQL => '`',
        DatabaseType::PostgreSQL | DatabaseType::SQLite => '"',
    };
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(quote);
    for c in name.chars() {
        if c == quote {
            quoted.push(quote);
        }
        quoted.push(c);
    }
    quoted.push(quote);
    quoted
}

/// Text form of a column for substring matching.
///
/// PostgreSQL renders `bytea` cast to text as hex, so binary columns are
/// decoded with `encode(.., 'escape')` instead.
fn column_text(column: &Column, db_type: DatabaseType) -> String {
    let ident = quote_ident(&column.name, db_type);
    match db_type {
        DatabaseType::PostgreSQL if column.data_type.eq_ignore_ascii_case("bytea") => {
            format!("encode({}, 'escape')", ident)
        }
        DatabaseType::PostgreSQL | DatabaseType::SQLite => format!("CAST({} AS TEXT)", ident),
        DatabaseType::MySQL => format!("CAST({} AS CHAR)", ident),
    }
}

/// Build the scan statement. Returns None when the table has no string-like column.
///
/// Both the column text and the bound pattern go through the database's own
/// `LOWER`, so case folding is the same on each side of `LIKE`. PostgreSQL
/// binds the pattern once as `$1`; MySQL and SQLite bind it once per column.
pub fn build_scan_sql(table: &Table, db_type: DatabaseType, limit: u32) -> Option<(String, usize)> {
    let columns: Vec<&Column> = table.string_columns().collect();
    if columns.is_empty() {
        return None;
    }

    let (placeholder, escape) = match db_type {
        DatabaseType::PostgreSQL => ("$1", " ESCAPE '\\'"),
        // Backslash is already MySQL's default LIKE escape
        DatabaseType::MySQL => ("?", ""),
        DatabaseType::SQLite => ("?", " ESCAPE '\\'"),
    };

    let conditions: Vec<String> = columns
        .iter()
        .map(|column| {
            format!(
                "LOWER({}) LIKE LOWER({}){}",
                column_text(column, db_type),
                placeholder,
                escape
            )
        })
        .collect();

    let sql = format!(
        "SELECT * FROM {} WHERE {} LIMIT {}",
        quote_ident(&table.name, db_type),
        conditions.join(" OR "),
        limit
    );
    let binds = match db_type {
        DatabaseType::PostgreSQL => 1,
        DatabaseType::MySQL | DatabaseType::SQLite => columns.len(),
    };
    Some((sql, binds))
}

/// Scanner backed by the connection pool. Each scan borrows its own pooled connection.
#[derive(Debug, Clone)]
pub struct SqlxTableScanner {
    pool: DbPool,
}

impl SqlxTableScanner {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TableScanner for SqlxTableScanner {
    async fn scan(&self, table: &Table, term: &str, limit: u32) -> ExplorerResult<Vec<Row>> {
        let Some((sql, binds)) = build_scan_sql(table, self.pool.db_type(), limit) else {
            return Ok(Vec::new());
        };
        let pattern = format!("%{}%", escape_like(term));

        let rows: Vec<Row> = match &self.pool {
            DbPool::Postgres(p) => {
                let mut query = sqlx::query(&sql);
                for _ in 0..binds {
                    query = query.bind(pattern.as_str());
                }
                query
                    .fetch_all(p)
                    .await?
                    .iter()
                    .map(|r| r.to_json_map())
                    .collect()
            }
            DbPool::MySql(p) => {
                let mut query = sqlx::query(&sql);
                for _ in 0..binds {
                    query = query.bind(pattern.as_str());
                }
                query
                    .fetch_all(p)
                    .await?
                    .iter()
                    .map(|r| r.to_json_map())
                    .collect()
            }
            DbPool::SQLite(p) => {
                let mut query = sqlx::query(&sql);
                for _ in 0..binds {
                    query = query.bind(pattern.as_str());
                }
                query
                    .fetch_all(p)
                    .await?
                    .iter()
                    .map(|r| r.to_json_map())
                    .collect()
            }
        };
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableKind;
    use sqlx::sqlite::SqlitePoolOptions;

    fn table() -> Table {
        Table::new("node_field_data", TableKind::Data).with_columns(vec![
            Column::new("nid", "INTEGER", true),
            Column::new("title", "VARCHAR(255)", false),
            Column::new("body", "TEXT", false),
        ])
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\tmp"), "c:\\\\tmp");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("node", DatabaseType::PostgreSQL), "\"node\"");
        assert_eq!(quote_ident("we\"ird", DatabaseType::SQLite), "\"we\"\"ird\"");
        assert_eq!(quote_ident("no`de", DatabaseType::MySQL), "`no``de`");
    }

    #[test]
    fn test_build_scan_sql_sqlite() {
        let (sql, binds) = build_scan_sql(&table(), DatabaseType::SQLite, 50).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"node_field_data\" WHERE \
             LOWER(CAST(\"title\" AS TEXT)) LIKE LOWER(?) ESCAPE '\\' OR \
             LOWER(CAST(\"body\" AS TEXT)) LIKE LOWER(?) ESCAPE '\\' LIMIT 50"
        );
        assert_eq!(binds, 2);
    }

    #[test]
    fn test_build_scan_sql_postgres_binds_once() {
        let (sql, binds) = build_scan_sql(&table(), DatabaseType::PostgreSQL, 10).unwrap();
        assert_eq!(sql.matches("$1").count(), 2);
        assert_eq!(binds, 1);
        assert!(sql.ends_with("LIMIT 10"));
    }

    #[test]
    fn test_build_scan_sql_mysql() {
        let (sql, binds) = build_scan_sql(&table(), DatabaseType::MySQL, 5).unwrap();
        assert!(sql.starts_with("SELECT * FROM `node_field_data` WHERE"));
        assert!(sql.contains("LOWER(CAST(`title` AS CHAR)) LIKE LOWER(?)"));
        assert!(!sql.contains("ESCAPE"));
        assert_eq!(binds, 2);
    }

    #[test]
    fn test_build_scan_sql_postgres_bytea() {
        let table = Table::new("file_blobs", TableKind::Other).with_columns(vec![
            Column::new("name", "character varying", false),
            Column::new("payload", "bytea", false),
        ]);
        let (sql, _) = build_scan_sql(&table, DatabaseType::PostgreSQL, 10).unwrap();
        assert!(sql.contains("LOWER(CAST(\"name\" AS TEXT)) LIKE LOWER($1)"));
        assert!(sql.contains("LOWER(encode(\"payload\", 'escape')) LIKE LOWER($1)"));
        assert!(!sql.contains("CAST(\"payload\""));
    }

    async fn notes_scanner() -> SqlxTableScanner {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO notes (body) VALUES ('Ärger im Büro'), ('plain text')")
            .execute(&pool)
            .await
            .unwrap();
        SqlxTableScanner::new(DbPool::SQLite(pool))
    }

    fn notes() -> Table {
        Table::new("notes", TableKind::Other).with_columns(vec![
            Column::new("id", "INTEGER", true),
            Column::new("body", "TEXT", false),
        ])
    }

    #[tokio::test]
    async fn test_sqlite_scan_matches_non_ascii_text() {
        let scanner = notes_scanner().await;
        for term in ["Ärger", "Büro", "ÄRGER IM", "büro"] {
            let rows = scanner.scan(&notes(), term, 10).await.unwrap();
            assert_eq!(rows.len(), 1, "term {:?}", term);
            assert_eq!(rows[0]["body"], "Ärger im Büro");
        }
    }

    #[tokio::test]
    async fn test_sqlite_scan_escapes_wildcards() {
        let scanner = notes_scanner().await;
        assert!(scanner.scan(&notes(), "%", 10).await.unwrap().is_empty());
        assert_eq!(scanner.scan(&notes(), "PLAIN", 10).await.unwrap().len(), 1);
    }

    #[test]
    fn test_no_string_columns() {
        let numeric = Table::new("counters", TableKind::Other)
            .with_columns(vec![Column::new("n", "INTEGER", true)]);
        assert!(build_scan_sql(&numeric, DatabaseType::SQLite, 50).is_none());
    }
}
