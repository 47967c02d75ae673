//! In-memory reflector and metadata provider for unit tests.

use crate::db::ColumnReflector;
use crate::error::{ExplorerError, ExplorerResult};
use crate::metadata::EntityMetadataProvider;
use crate::models::{Column, EntityType, FieldStorage};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
pub struct FakeReflector {
    tables: BTreeMap<String, Vec<Column>>,
    failing: HashSet<String>,
}

impl FakeReflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        let columns = columns
            .iter()
            .map(|(n, t)| Column::new(*n, *t, false))
            .collect();
        self.tables.insert(name.to_string(), columns);
        self
    }

    /// Table that exists but whose columns cannot be read.
    pub fn with_failing_table(mut self, name: &str) -> Self {
        self.tables.insert(name.to_string(), Vec::new());
        self.failing.insert(name.to_string());
        self
    }
}

#[async_trait]
impl ColumnReflector for FakeReflector {
    async fn list_columns(&self, table: &str) -> ExplorerResult<Vec<Column>> {
        if self.failing.contains(table) {
            return Err(ExplorerError::database(
                "permission denied",
                Some("42501".to_string()),
                "Grant SELECT on the table",
            ));
        }
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    async fn table_exists(&self, table: &str) -> ExplorerResult<bool> {
        Ok(self.tables.contains_key(table))
    }

    async fn list_tables(&self) -> ExplorerResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    entities: Vec<(EntityType, Option<Vec<FieldStorage>>)>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: EntityType, fields: Vec<FieldStorage>) -> Self {
        self.entities.push((entity, Some(fields)));
        self
    }

    /// Entity type whose field storage lookup fails.
    pub fn with_failing_entity(mut self, entity: EntityType) -> Self {
        self.entities.push((entity, None));
        self
    }
}

#[async_trait]
impl EntityMetadataProvider for FakeProvider {
    async fn list_entity_types(&self) -> ExplorerResult<Vec<EntityType>> {
        Ok(self.entities.iter().map(|(e, _)| e.clone()).collect())
    }

    async fn get_entity_type(&self, id: &str) -> ExplorerResult<EntityType> {
        self.entities
            .iter()
            .find(|(e, _)| e.id == id)
            .map(|(e, _)| e.clone())
            .ok_or_else(|| ExplorerError::entity_type_not_found(id))
    }

    async fn list_field_storage(&self, entity_type_id: &str) -> ExplorerResult<Vec<FieldStorage>> {
        match self.entities.iter().find(|(e, _)| e.id == entity_type_id) {
            Some((_, Some(fields))) => Ok(fields.clone()),
            Some((_, None)) => Err(ExplorerError::internal("field storage lookup failed")),
            None => Err(ExplorerError::entity_type_not_found(entity_type_id)),
        }
    }
}
