//! Shared fixtures: a small entity-oriented SQLite database on disk.

#![allow(dead_code)]

use schema_explorer::config::DatabaseConfig;
use schema_explorer::db::{DbPool, connect};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

pub const MANIFEST: &str = r#"{
  "entity_types": [
    {
      "id": "node",
      "label": "Content",
      "base_table": "node",
      "data_table": "node_field_data",
      "revision_table": "node_revision",
      "revision_data_table": "node_field_revision",
      "bundles": { "article": "Article", "page": "Basic page" },
      "fields": [
        { "name": "nid", "is_base_field": true },
        {
          "name": "body",
          "has_dedicated_table": true,
          "dedicated_data_table": "node__body",
          "dedicated_revision_table": "node_revision__body",
          "bundles": ["article"]
        },
        {
          "name": "field_tags",
          "has_dedicated_table": true,
          "dedicated_data_table": "node__field_tags",
          "dedicated_revision_table": "node_revision__field_tags",
          "bundles": ["page"]
        }
      ]
    },
    {
      "id": "user",
      "label": "User",
      "base_table": "users",
      "data_table": "users_field_data"
    }
  ]
}"#;

const SCHEMA: &[&str] = &[
    "CREATE TABLE node (nid INTEGER PRIMARY KEY, uuid VARCHAR(128) NOT NULL, type VARCHAR(32))",
    "CREATE TABLE node_field_data (nid INTEGER NOT NULL, title VARCHAR(255), status INTEGER)",
    "CREATE TABLE node_revision (vid INTEGER PRIMARY KEY, nid INTEGER NOT NULL)",
    "CREATE TABLE node_field_revision (vid INTEGER NOT NULL, title VARCHAR(255))",
    "CREATE TABLE node__body (entity_id INTEGER NOT NULL, body_value TEXT, body_format VARCHAR(255))",
    "CREATE TABLE node_revision__body (revision_id INTEGER NOT NULL, body_value TEXT)",
    "CREATE TABLE node__field_tags (entity_id INTEGER NOT NULL, field_tags_target_id INTEGER)",
    "CREATE TABLE node_revision__field_tags (revision_id INTEGER NOT NULL, field_tags_target_id INTEGER)",
    "CREATE TABLE users (uid INTEGER PRIMARY KEY, uuid VARCHAR(128))",
    "CREATE TABLE users_field_data (uid INTEGER NOT NULL, name VARCHAR(60), mail VARCHAR(254))",
    "CREATE TABLE uid_map (old_uid INTEGER, new_uid INTEGER)",
    "CREATE TABLE cache_render (cid VARCHAR(255), data BLOB)",
    "CREATE TABLE watchdog (wid INTEGER PRIMARY KEY, message TEXT)",
    "INSERT INTO node (nid, uuid, type) VALUES (1, 'a1', 'article'), (2, 'b2', 'page')",
    "INSERT INTO node_field_data (nid, title, status) VALUES (1, 'Finding the Needle', 1), (2, 'About us', 1)",
    "INSERT INTO node__body (entity_id, body_value, body_format) VALUES (1, 'Haystack text', 'basic_html')",
    "INSERT INTO users_field_data (uid, name, mail) VALUES (1, 'admin', 'admin@example.com')",
    "INSERT INTO cache_render (cid, data) VALUES ('needle:cached', X'00')",
    "INSERT INTO watchdog (message) VALUES ('needle in the logs')",
];

/// A populated site database in a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub url: String,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.db");
        let url = format!("sqlite:{}", path.display());

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&format!("{}?mode=rwc", url))
            .await
            .unwrap();
        for statement in SCHEMA {
            sqlx::query(statement).execute(&writer).await.unwrap();
        }
        writer.close().await;

        Self { dir, url }
    }

    /// Read-only pool opened the way the server opens it.
    pub async fn connect(&self) -> DbPool {
        let config = DatabaseConfig::parse(&self.url).unwrap();
        connect(&config).await.unwrap()
    }

    pub fn manifest_path(&self) -> std::path::PathBuf {
        let path = self.dir.path().join("entities.json");
        std::fs::write(&path, MANIFEST).unwrap();
        path
    }
}
