//! Name and value search over a real SQLite database.

mod common;

use common::Fixture;
use schema_explorer::Explorer;
use schema_explorer::models::SearchResult;
use schema_explorer::search::SearchSettings;
use schema_explorer::tools::{SearchInput, SearchToolHandler, SearchType};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_value_search_finds_needle() {
    let fixture = Fixture::new().await;
    let explorer = Explorer::new(fixture.connect().await);

    let report = explorer.search_by_value("needle", Some(50)).await.unwrap();

    // cache_render and watchdog also contain the term but are denylisted
    assert_eq!(report.results.len(), 1);
    match &report.results[0] {
        SearchResult::Value {
            table,
            matches,
            count,
        } => {
            assert_eq!(table, "node_field_data");
            assert_eq!(*count, 1);
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0]["title"], "Finding the Needle");
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(report.skipped, 0);
    assert!(!report.deadline_expired);
}

#[tokio::test]
async fn test_value_search_without_denylist() {
    let fixture = Fixture::new().await;
    let settings = SearchSettings {
        skip_prefixes: Vec::new(),
        ..SearchSettings::default()
    };
    let explorer = Explorer::new(fixture.connect().await).with_search_settings(settings);

    let report = explorer.search_by_value("needle", None).await.unwrap();
    let tables: Vec<_> = report.results.iter().map(|r| r.table_name()).collect();
    assert_eq!(tables, vec!["cache_render", "node_field_data", "watchdog"]);
}

#[tokio::test]
async fn test_value_search_treats_wildcards_literally() {
    let fixture = Fixture::new().await;
    let explorer = Explorer::new(fixture.connect().await);

    let report = explorer.search_by_value("%", None).await.unwrap();
    assert!(report.results.is_empty());

    let report = explorer.search_by_value("admin@", None).await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].table_name(), "users_field_data");
}

#[tokio::test]
async fn test_value_search_with_single_worker() {
    let fixture = Fixture::new().await;
    let settings = SearchSettings {
        workers: 1,
        table_timeout: Duration::from_secs(10),
        ..SearchSettings::default()
    };
    let explorer = Explorer::new(fixture.connect().await).with_search_settings(settings);

    let report = explorer.search_by_value("HAYSTACK", None).await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].table_name(), "node__body");
}

#[tokio::test]
async fn test_name_search_table_match_short_circuits() {
    let fixture = Fixture::new().await;
    let explorer = Explorer::new(fixture.connect().await);

    let results = explorer.search_by_field_name("uid").await.unwrap();
    let uid_map: Vec<_> = results
        .iter()
        .filter(|r| r.table_name() == "uid_map")
        .collect();
    assert_eq!(uid_map.len(), 1);
    assert!(matches!(uid_map[0], SearchResult::Table { columns, .. } if columns.len() == 2));

    // Column-level matches elsewhere
    let users = results
        .iter()
        .find(|r| r.table_name() == "users_field_data")
        .unwrap();
    assert!(matches!(users, SearchResult::Columns { columns, .. } if columns[0].name == "uid"));
}

#[tokio::test]
async fn test_search_tool_both_modes() {
    let fixture = Fixture::new().await;
    let handler = SearchToolHandler::new(Arc::new(Explorer::new(fixture.connect().await)));

    let output = handler
        .search(SearchInput {
            term: "needle".into(),
            search_type: SearchType::Value,
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(output.count, 1);
    assert_eq!(output.results[0].kind, "value");
    assert!(output.tables_scanned.unwrap() > 0);
    assert!(output.warning.is_none());

    let output = handler
        .search(SearchInput {
            term: "mail".into(),
            search_type: SearchType::Field,
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(output.count, 1);
    assert_eq!(output.results[0].kind, "columns");
    assert!(output.tables_scanned.is_none());
}
