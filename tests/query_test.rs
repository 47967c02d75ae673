//! Read-only query gate and execution over a real SQLite database.

mod common;

use common::Fixture;
use schema_explorer::Explorer;
use schema_explorer::db::{DbPool, QueryExecutor};
use schema_explorer::error::{ExplorerError, QueryRejectionKind};
use schema_explorer::models::QueryRequest;
use schema_explorer::tools::sql_validator::KeywordPolicy;
use schema_explorer::tools::{QueryInput, QueryToolHandler};
use std::sync::Arc;

#[tokio::test]
async fn test_select_is_case_insensitive() {
    let fixture = Fixture::new().await;
    let pool = fixture.connect().await;
    let executor = QueryExecutor::default();

    let upper = executor.execute(&pool, "SELECT * FROM node").await.unwrap();
    assert_eq!(upper.row_count, 2);
    let lower = executor.execute(&pool, "select * from node").await.unwrap();
    assert_eq!(lower.rows, upper.rows);
    assert_eq!(upper.columns[0].name, "nid");
}

#[tokio::test]
async fn test_rejections() {
    let fixture = Fixture::new().await;
    let pool = fixture.connect().await;
    let executor = QueryExecutor::default();

    let err = executor
        .execute(&pool, "SELECT * FROM node; DROP TABLE node")
        .await
        .unwrap_err();
    assert_eq!(err.rejection_kind(), Some(QueryRejectionKind::ForbiddenKeyword));
    assert!(matches!(err, ExplorerError::ForbiddenKeyword { ref keyword } if keyword == "DROP"));

    let err = executor
        .execute(&pool, "UPDATE node SET type = 'x'")
        .await
        .unwrap_err();
    assert_eq!(err.rejection_kind(), Some(QueryRejectionKind::NotASelect));

    let err = executor
        .execute(&pool, "SELECT * FROM no_such_table")
        .await
        .unwrap_err();
    assert_eq!(err.rejection_kind(), Some(QueryRejectionKind::ExecutionFailed));

    // The table is still there
    assert_eq!(
        executor.execute(&pool, "SELECT nid FROM node").await.unwrap().row_count,
        2
    );
}

#[tokio::test]
async fn test_keyword_policies() {
    let fixture = Fixture::new().await;
    let pool = fixture.connect().await;
    let sql = "SELECT nid AS updated_at FROM node";

    let err = QueryExecutor::new(KeywordPolicy::Substring)
        .execute(&pool, sql)
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::ForbiddenKeyword { .. }));

    let result = QueryExecutor::new(KeywordPolicy::Token)
        .execute(&pool, sql)
        .await
        .unwrap();
    assert_eq!(result.row_count, 2);

    let err = QueryExecutor::new(KeywordPolicy::Token)
        .execute(&pool, "SELECT 1; DROP TABLE node")
        .await
        .unwrap_err();
    assert!(matches!(err, ExplorerError::ForbiddenKeyword { .. }));
}

#[tokio::test]
async fn test_connection_is_read_only() {
    let fixture = Fixture::new().await;
    let DbPool::SQLite(pool) = fixture.connect().await else {
        panic!("expected a SQLite pool");
    };

    let result = sqlx::query("INSERT INTO node (nid, uuid) VALUES (3, 'c3')")
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_query_tool_limit() {
    let fixture = Fixture::new().await;
    let handler = QueryToolHandler::new(Arc::new(Explorer::new(fixture.connect().await)));

    let output = handler
        .query(QueryInput {
            sql: "SELECT * FROM node ORDER BY nid".into(),
            limit: Some(1),
            timeout_secs: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(output.row_count, 1);
    assert!(output.truncated);
    assert_eq!(output.rows[0]["nid"], 1);
}

#[tokio::test]
async fn test_explorer_query_full_rows() {
    let fixture = Fixture::new().await;
    let explorer = Explorer::new(fixture.connect().await);

    let (result, truncated) = explorer
        .query(&QueryRequest::new("SELECT title FROM node_field_data ORDER BY nid"))
        .await
        .unwrap();
    assert!(!truncated);
    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[1]["title"], "About us");
}
