//! Query execution.
//!
//! [`QueryExecutor`] runs one validated, read-only query per call.
//! [`QueryExecutor::execute`] returns the full row set; callers that cap rows
//! use [`QueryExecutor::execute_bounded`], which stops reading after one row
//! past the limit. Timeouts belong to the caller.
//!
//! Each driver has its own submodule with the same `fetch_rows` function.
//! A single pooled connection is acquired per call and returned to the pool
//! when the function exits, on success, error or cancellation.

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::QueryResult;
use crate::tools::sql_validator::{KeywordPolicy, validate_select};
use std::time::Instant;
use tracing::{debug, info};

/// Validates and executes read-only queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor {
    policy: KeywordPolicy,
}

impl QueryExecutor {
    pub fn new(policy: KeywordPolicy) -> Self {
        Self { policy }
    }

    /// Check `sql` against the read-only gate without executing it.
    pub fn validate(&self, sql: &str, pool: &DbPool) -> ExplorerResult<()> {
        validate_select(sql, self.policy, pool.db_type())
    }

    /// Validate and execute `sql`, returning every row.
    ///
    /// Rejections are [`ExplorerError::NotASelect`] or
    /// [`ExplorerError::ForbiddenKeyword`]; any failure after validation is
    /// reported as [`ExplorerError::ExecutionFailed`].
    pub async fn execute(&self, pool: &DbPool, sql: &str) -> ExplorerResult<QueryResult> {
        self.run(pool, sql, None).await
    }

    /// Validate and execute `sql`, reading at most `limit` rows.
    ///
    /// Rows are streamed and the query is abandoned once `limit + 1` rows have
    /// arrived. Returns the result and whether more rows were available.
    pub async fn execute_bounded(
        &self,
        pool: &DbPool,
        sql: &str,
        limit: u32,
    ) -> ExplorerResult<(QueryResult, bool)> {
        let mut result = self.run(pool, sql, Some(limit as usize + 1)).await?;
        let truncated = result.truncate(limit as usize);
        Ok((result, truncated))
    }

    async fn run(
        &self,
        pool: &DbPool,
        sql: &str,
        max_rows: Option<usize>,
    ) -> ExplorerResult<QueryResult> {
        if let Err(rejection) = self.validate(sql, pool) {
            info!(error = %rejection, "Query rejected");
            return Err(rejection);
        }

        let sql = sql.trim();
        let start = Instant::now();
        debug!(sql = %sql, "Executing query");

        let result = match pool {
            DbPool::MySql(p) => mysql::fetch_rows(p, sql, max_rows)
                .await
                .map(|rows| to_result(rows, start)),
            DbPool::Postgres(p) => postgres::fetch_rows(p, sql, max_rows)
                .await
                .map(|rows| to_result(rows, start)),
            DbPool::SQLite(p) => sqlite::fetch_rows(p, sql, max_rows)
                .await
                .map(|rows| to_result(rows, start)),
        };

        result.map_err(|e| {
            let message = match &e {
                sqlx::Error::Database(db_err) => db_err.message().to_string(),
                other => other.to_string(),
            };
            info!(error = %message, "Query execution failed");
            ExplorerError::execution_failed(message)
        })
    }
}

fn to_result<R: RowToJson>(rows: Vec<R>, start: Instant) -> QueryResult {
    let columns = rows
        .first()
        .map(|r| r.column_metadata())
        .unwrap_or_default();
    let json_rows = rows.iter().map(|r| r.to_json_map()).collect();
    let execution_time_ms = start.elapsed().as_millis() as u64;
    QueryResult::new(columns, json_rows, execution_time_ms)
}

// Raw SQL is sent unprepared through the connection's `Executor` impl.

mod mysql {
    use futures_util::{StreamExt, TryStreamExt};
    use sqlx::mysql::MySqlRow;
    use sqlx::{Executor, MySqlPool};

    pub async fn fetch_rows(
        pool: &MySqlPool,
        sql: &str,
        max_rows: Option<usize>,
    ) -> Result<Vec<MySqlRow>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        match max_rows {
            Some(max) => (&mut *conn).fetch(sql).take(max).try_collect().await,
            None => (&mut *conn).fetch_all(sql).await,
        }
    }
}

mod postgres {
    use futures_util::{StreamExt, TryStreamExt};
    use sqlx::postgres::PgRow;
    use sqlx::{Executor, PgPool};

    pub async fn fetch_rows(
        pool: &PgPool,
        sql: &str,
        max_rows: Option<usize>,
    ) -> Result<Vec<PgRow>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        match max_rows {
            Some(max) => (&mut *conn).fetch(sql).take(max).try_collect().await,
            None => (&mut *conn).fetch_all(sql).await,
        }
    }
}

mod sqlite {
    use futures_util::{StreamExt, TryStreamExt};
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Executor, SqlitePool};

    pub async fn fetch_rows(
        pool: &SqlitePool,
        sql: &str,
        max_rows: Option<usize>,
    ) -> Result<Vec<SqliteRow>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        match max_rows {
            Some(max) => (&mut *conn).fetch(sql).take(max).try_collect().await,
            None => (&mut *conn).fetch_all(sql).await,
        }
    }
}
