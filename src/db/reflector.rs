//! Column reflection.
//!
//! The catalog builder only sees the [`ColumnReflector`] trait. [`SqlxReflector`]
//! implements it for each supported driver; the SQL for each backend lives in
//! the `queries` submodule, and each backend module exposes the same functions.

use crate::db::pool::DbPool;
use crate::error::ExplorerResult;
use crate::models::Column;
use async_trait::async_trait;
use tracing::debug;

/// Driver-specific table and column introspection.
#[async_trait]
pub trait ColumnReflector: Send + Sync {
    /// Ordered column list of `table`.
    async fn list_columns(&self, table: &str) -> ExplorerResult<Vec<Column>>;

    async fn table_exists(&self, table: &str) -> ExplorerResult<bool>;

    /// Physical base tables visible to the connection, sorted by name.
    async fn list_tables(&self) -> ExplorerResult<Vec<String>>;
}

/// Reflector backed by the live connection pool.
#[derive(Debug, Clone)]
pub struct SqlxReflector {
    pool: DbPool,
}

impl SqlxReflector {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ColumnReflector for SqlxReflector {
    async fn list_columns(&self, table: &str) -> ExplorerResult<Vec<Column>> {
        let columns = match &self.pool {
            DbPool::Postgres(p) => postgres::list_columns(p, table).await?,
            DbPool::MySql(p) => mysql::list_columns(p, table).await?,
            DbPool::SQLite(p) => sqlite::list_columns(p, table).await?,
        };
        debug!(table = %table, count = columns.len(), "Reflected columns");
        Ok(columns)
    }

    async fn table_exists(&self, table: &str) -> ExplorerResult<bool> {
        match &self.pool {
            DbPool::Postgres(p) => postgres::table_exists(p, table).await,
            DbPool::MySql(p) => mysql::table_exists(p, table).await,
            DbPool::SQLite(p) => sqlite::table_exists(p, table).await,
        }
    }

    async fn list_tables(&self) -> ExplorerResult<Vec<String>> {
        let tables = match &self.pool {
            DbPool::Postgres(p) => postgres::list_tables(p).await?,
            DbPool::MySql(p) => mysql::list_tables(p).await?,
            DbPool::SQLite(p) => sqlite::list_tables(p).await?,
        };
        debug!(count = tables.len(), "Listed physical tables");
        Ok(tables)
    }
}

mod queries {
    pub mod postgres {
        pub const LIST_COLUMNS: &str = r#"
            SELECT
                column_name::text AS column_name,
                data_type::text AS data_type,
                is_nullable::text AS is_nullable
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#;

        pub const TABLE_EXISTS: &str = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#;
    }

    pub mod mysql {
        pub const LIST_COLUMNS: &str = r#"
            SELECT
                CONVERT(COLUMN_NAME USING utf8) AS COLUMN_NAME,
                CONVERT(COLUMN_TYPE USING utf8) AS COLUMN_TYPE,
                CONVERT(IS_NULLABLE USING utf8) AS IS_NULLABLE
            FROM information_schema.columns
            WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
            ORDER BY ORDINAL_POSITION
            "#;

        pub const TABLE_EXISTS: &str = r#"
            SELECT COUNT(*) FROM information_schema.TABLES
            WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT CONVERT(TABLE_NAME USING utf8) AS TABLE_NAME
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#;
    }

    pub mod sqlite {
        pub const LIST_COLUMNS: &str =
            r#"SELECT name, type, "notnull" FROM pragma_table_info(?) ORDER BY cid"#;

        pub const TABLE_EXISTS: &str = r#"
            SELECT COUNT(*) FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?
            "#;

        pub const LIST_TABLES: &str = r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
            AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#;
    }
}

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn list_columns(pool: &PgPool, table: &str) -> ExplorerResult<Vec<Column>> {
        let rows = sqlx::query(queries::postgres::LIST_COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("column_name")?;
                let data_type: String = row.try_get("data_type")?;
                let nullable: String = row.try_get("is_nullable")?;
                Ok(Column::new(name, data_type, nullable != "YES"))
            })
            .collect()
    }

    pub async fn table_exists(pool: &PgPool, table: &str) -> ExplorerResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(queries::postgres::TABLE_EXISTS)
            .bind(table)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    pub async fn list_tables(pool: &PgPool) -> ExplorerResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(queries::postgres::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        Ok(names)
    }
}

mod mysql {
    use super::*;
    use sqlx::{MySqlPool, Row};

    /// information_schema columns come back as VARCHAR or VARBINARY depending on server version.
    fn get_string(row: &sqlx::mysql::MySqlRow, column: &str) -> ExplorerResult<String> {
        if let Ok(s) = row.try_get::<String, _>(column) {
            return Ok(s);
        }
        let bytes: Vec<u8> = row.try_get(column)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn list_columns(pool: &MySqlPool, table: &str) -> ExplorerResult<Vec<Column>> {
        let rows = sqlx::query(queries::mysql::LIST_COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let name = get_string(row, "COLUMN_NAME")?;
                let column_type = get_string(row, "COLUMN_TYPE")?;
                let nullable = get_string(row, "IS_NULLABLE")?;
                Ok(Column::new(name, column_type, nullable != "YES"))
            })
            .collect()
    }

    pub async fn table_exists(pool: &MySqlPool, table: &str) -> ExplorerResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(queries::mysql::TABLE_EXISTS)
            .bind(table)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn list_tables(pool: &MySqlPool) -> ExplorerResult<Vec<String>> {
        let rows = sqlx::query(queries::mysql::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        rows.iter().map(|row| get_string(row, "TABLE_NAME")).collect()
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn list_columns(pool: &SqlitePool, table: &str) -> ExplorerResult<Vec<Column>> {
        let rows = sqlx::query(queries::sqlite::LIST_COLUMNS)
            .bind(table)
            .fetch_all(pool)
            .await?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("name")?;
                let data_type: String = row.try_get("type")?;
                let notnull: i64 = row.try_get("notnull")?;
                Ok(Column::new(name, data_type, notnull != 0))
            })
            .collect()
    }

    pub async fn table_exists(pool: &SqlitePool, table: &str) -> ExplorerResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(queries::sqlite::TABLE_EXISTS)
            .bind(table)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn list_tables(pool: &SqlitePool) -> ExplorerResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(queries::sqlite::LIST_TABLES)
            .fetch_all(pool)
            .await?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn memory_pool() -> DbPool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE node_field_data (nid INTEGER NOT NULL, title VARCHAR(255), body TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        DbPool::SQLite(pool)
    }

    #[tokio::test]
    async fn test_sqlite_list_columns_in_order() {
        let reflector = SqlxReflector::new(memory_pool().await);
        let columns = reflector.list_columns("node_field_data").await.unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["nid", "title", "body"]);
        assert!(columns[0].not_null);
        assert!(!columns[1].not_null);
        assert_eq!(columns[1].data_type, "VARCHAR(255)");
    }

    #[tokio::test]
    async fn test_sqlite_table_exists() {
        let reflector = SqlxReflector::new(memory_pool().await);
        assert!(reflector.table_exists("node_field_data").await.unwrap());
        assert!(!reflector.table_exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_list_tables_excludes_internal() {
        let reflector = SqlxReflector::new(memory_pool().await);
        let tables = reflector.list_tables().await.unwrap();
        assert_eq!(tables, vec!["node_field_data".to_string()]);
    }
}
