//! Catalog construction.

use crate::db::ColumnReflector;
use crate::error::{ExplorerError, ExplorerResult};
use crate::metadata::EntityMetadataProvider;
use crate::models::{Catalog, EntityType, Table, TableKind};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Builds a fresh [`Catalog`] from entity metadata and column reflection.
///
/// Tables are recorded in a fixed order: for each entity type its storage
/// tiers (base, data, revision, revision data), then its dedicated field
/// tables. When two entity types name the same table, the first one keeps it.
pub struct CatalogBuilder<'a> {
    reflector: &'a dyn ColumnReflector,
    provider: &'a dyn EntityMetadataProvider,
    include_unowned: bool,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(
        reflector: &'a dyn ColumnReflector,
        provider: &'a dyn EntityMetadataProvider,
    ) -> Self {
        Self {
            reflector,
            provider,
            include_unowned: true,
        }
    }

    /// Also record physical tables no entity type owns (kind `other`).
    pub fn include_unowned(mut self, include: bool) -> Self {
        self.include_unowned = include;
        self
    }

    /// Build the catalog.
    ///
    /// Only a failure to enumerate entity types is returned as an error.
    /// Per-table reflection failures and per-entity-type metadata failures
    /// are logged and recorded on the catalog.
    pub async fn build(&self) -> ExplorerResult<Catalog> {
        let start = Instant::now();
        let mut catalog = Catalog::new();

        let entity_types = self.provider.list_entity_types().await?;
        for entity_type in entity_types {
            self.add_entity_type(&mut catalog, entity_type).await;
        }

        if self.include_unowned {
            self.add_unowned_tables(&mut catalog).await;
        }

        info!(
            tables = catalog.table_count(),
            entity_types = catalog.entity_types.len(),
            unavailable = catalog.unavailable_entity_types.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built schema catalog"
        );
        Ok(catalog)
    }

    async fn add_entity_type(&self, catalog: &mut Catalog, mut entity_type: EntityType) {
        let id = entity_type.id.clone();

        let fields = match self.provider.list_field_storage(&id).await {
            Ok(fields) => fields,
            Err(e) => {
                let err = match e {
                    ExplorerError::MetadataUnavailable { .. } => e,
                    other => ExplorerError::metadata_unavailable(&id, other.to_string()),
                };
                warn!(entity_type = %id, error = %err, "Skipping entity type");
                catalog.unavailable_entity_types.push(id);
                return;
            }
        };

        let tiers: Vec<(String, TableKind)> = entity_type
            .storage_tables()
            .into_iter()
            .map(|(name, kind)| (name.to_string(), kind))
            .collect();
        for (name, kind) in tiers {
            let table = Table::new(&name, kind).with_entity_type(&id);
            self.record(catalog, table).await;
        }

        entity_type.field_tables.clear();
        for field in &fields {
            let Some(tables) = field.dedicated_tables() else {
                continue;
            };
            let data = Table::new(&tables.data_table, TableKind::FieldData)
                .with_entity_type(&id)
                .with_field_name(&field.name);
            self.record(catalog, data).await;

            if let Some(revision_table) = &tables.revision_table {
                let revision = Table::new(revision_table, TableKind::FieldRevision)
                    .with_entity_type(&id)
                    .with_field_name(&field.name);
                self.record(catalog, revision).await;
            }
            entity_type.field_tables.push(tables);
        }

        debug!(
            entity_type = %id,
            field_tables = entity_type.field_tables.len(),
            "Cataloged entity type"
        );
        catalog.entity_types.insert(id, entity_type);
    }

    async fn add_unowned_tables(&self, catalog: &mut Catalog) {
        let names = match self.reflector.list_tables().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not enumerate physical tables");
                return;
            }
        };

        for name in names {
            if catalog.table(&name).is_some() {
                continue;
            }
            let table = Table::new(&name, TableKind::Other);
            let table = self.reflect_columns(table).await;
            catalog.insert_table(table);
        }
    }

    /// Reflect and insert `table` unless the name is already taken.
    async fn record(&self, catalog: &mut Catalog, mut table: Table) {
        if let Some(existing) = catalog.table(&table.name) {
            debug!(
                table = %table.name,
                owner = ?existing.entity_type,
                claimed_by = ?table.entity_type,
                "Table already cataloged, keeping first owner"
            );
            return;
        }

        match self.reflector.table_exists(&table.name).await {
            Ok(true) => table = self.reflect_columns(table).await,
            Ok(false) => {
                debug!(table = %table.name, "Table does not exist");
                table.exists = false;
            }
            Err(e) => {
                let err = ExplorerError::reflection_failed(&table.name, e.to_string());
                warn!(table = %table.name, error = %err, "Table existence check failed");
                table.reflection_error = Some(e.to_string());
            }
        }
        catalog.insert_table(table);
    }

    async fn reflect_columns(&self, mut table: Table) -> Table {
        match self.reflector.list_columns(&table.name).await {
            Ok(columns) => table.columns = columns,
            Err(e) => {
                let err = ExplorerError::reflection_failed(&table.name, e.to_string());
                warn!(table = %table.name, error = %err, "Column reflection failed");
                table.reflection_error = Some(e.to_string());
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{FakeProvider, FakeReflector};
    use crate::models::FieldStorage;

    fn node_type() -> EntityType {
        EntityType::new("node", "Content")
            .with_base_table("node")
            .with_data_table("node_field_data")
            .with_revision_table("node_revision")
            .with_revision_data_table("node_field_revision")
            .with_bundle("article", "Article")
    }

    fn body_field() -> FieldStorage {
        FieldStorage {
            name: "body".into(),
            is_base_field: false,
            has_dedicated_table: true,
            dedicated_data_table: Some("node__body".into()),
            dedicated_revision_table: Some("node_revision__body".into()),
            bundles: vec![],
        }
    }

    #[tokio::test]
    async fn test_records_storage_and_field_tables() {
        let reflector = FakeReflector::new()
            .with_table("node", &[("nid", "int")])
            .with_table("node_field_data", &[("title", "varchar(255)")])
            .with_table("node_revision", &[("vid", "int")])
            .with_table("node_field_revision", &[("title", "varchar(255)")])
            .with_table("node__body", &[("body_value", "longtext")])
            .with_table("node_revision__body", &[("body_value", "longtext")]);
        let provider = FakeProvider::new().with_entity(node_type(), vec![body_field()]);

        let catalog = CatalogBuilder::new(&reflector, &provider)
            .build()
            .await
            .unwrap();

        assert_eq!(catalog.table_count(), 6);
        let body = catalog.table("node__body").unwrap();
        assert_eq!(body.kind, TableKind::FieldData);
        assert_eq!(body.entity_type.as_deref(), Some("node"));
        assert_eq!(body.field_name.as_deref(), Some("body"));
        assert_eq!(body.columns.len(), 1);
        assert_eq!(
            catalog.table("node_revision__body").unwrap().kind,
            TableKind::FieldRevision
        );
        assert_eq!(catalog.entity_type("node").unwrap().field_tables.len(), 1);
    }

    #[tokio::test]
    async fn test_reflection_failure_is_absorbed() {
        let reflector = FakeReflector::new()
            .with_table("node", &[("nid", "int")])
            .with_failing_table("node_field_data");
        let entity = EntityType::new("node", "Content")
            .with_base_table("node")
            .with_data_table("node_field_data");
        let provider = FakeProvider::new().with_entity(entity, vec![]);

        let catalog = CatalogBuilder::new(&reflector, &provider)
            .build()
            .await
            .unwrap();

        let failed = catalog.table("node_field_data").unwrap();
        assert!(failed.columns.is_empty());
        assert!(failed.reflection_error.is_some());
        assert!(catalog.table("node").unwrap().reflection_error.is_none());
    }

    #[tokio::test]
    async fn test_missing_table_marked() {
        let reflector = FakeReflector::new().with_table("node", &[("nid", "int")]);
        let entity = EntityType::new("node", "Content")
            .with_base_table("node")
            .with_revision_table("node_revision");
        let provider = FakeProvider::new().with_entity(entity, vec![]);

        let catalog = CatalogBuilder::new(&reflector, &provider)
            .build()
            .await
            .unwrap();
        let missing = catalog.table("node_revision").unwrap();
        assert!(!missing.exists);
        assert!(missing.columns.is_empty());
        assert!(missing.reflection_error.is_none());
    }

    #[tokio::test]
    async fn test_metadata_failure_skips_entity_type() {
        let reflector = FakeReflector::new()
            .with_table("node", &[("nid", "int")])
            .with_table("users", &[("uid", "int")]);
        let provider = FakeProvider::new()
            .with_failing_entity(EntityType::new("node", "Content").with_base_table("node"))
            .with_entity(EntityType::new("user", "User").with_base_table("users"), vec![]);

        let catalog = CatalogBuilder::new(&reflector, &provider)
            .include_unowned(false)
            .build()
            .await
            .unwrap();

        assert_eq!(catalog.unavailable_entity_types, vec!["node".to_string()]);
        assert!(catalog.entity_type("node").is_none());
        assert!(catalog.table("node").is_none());
        assert!(catalog.table("users").is_some());
    }

    #[tokio::test]
    async fn test_first_owner_wins() {
        let reflector = FakeReflector::new().with_table("shared", &[("id", "int")]);
        let provider = FakeProvider::new()
            .with_entity(EntityType::new("a", "A").with_base_table("shared"), vec![])
            .with_entity(EntityType::new("b", "B").with_data_table("shared"), vec![]);

        let catalog = CatalogBuilder::new(&reflector, &provider)
            .build()
            .await
            .unwrap();

        let shared = catalog.table("shared").unwrap();
        assert_eq!(shared.entity_type.as_deref(), Some("a"));
        assert_eq!(shared.kind, TableKind::Base);
        assert_eq!(catalog.table_count(), 1);
    }

    #[tokio::test]
    async fn test_unowned_tables() {
        let reflector = FakeReflector::new()
            .with_table("node", &[("nid", "int")])
            .with_table("uid_map", &[("uid", "int")]);
        let provider = FakeProvider::new()
            .with_entity(EntityType::new("node", "Content").with_base_table("node"), vec![]);

        let catalog = CatalogBuilder::new(&reflector, &provider)
            .build()
            .await
            .unwrap();
        let other = catalog.table("uid_map").unwrap();
        assert_eq!(other.kind, TableKind::Other);
        assert!(other.entity_type.is_none());
        assert_eq!(catalog.table("node").unwrap().kind, TableKind::Base);

        let owned_only = CatalogBuilder::new(&reflector, &provider)
            .include_unowned(false)
            .build()
            .await
            .unwrap();
        assert!(owned_only.table("uid_map").is_none());
    }

    #[tokio::test]
    async fn test_base_fields_have_no_tables() {
        let reflector = FakeReflector::new().with_table("node", &[("nid", "int")]);
        let title = FieldStorage {
            name: "title".into(),
            is_base_field: true,
            has_dedicated_table: false,
            dedicated_data_table: None,
            dedicated_revision_table: None,
            bundles: vec![],
        };
        let provider = FakeProvider::new().with_entity(
            EntityType::new("node", "Content").with_base_table("node"),
            vec![title],
        );
        let catalog = CatalogBuilder::new(&reflector, &provider)
            .include_unowned(false)
            .build()
            .await
            .unwrap();
        assert_eq!(catalog.table_count(), 1);
        assert!(catalog.entity_type("node").unwrap().field_tables.is_empty());
    }
}
