//! Schema catalog tool.
//!
//! This module implements the `get_schema` MCP tool.

use crate::error::{ExplorerError, ExplorerResult};
use crate::explorer::Explorer;
use crate::models::{Catalog, Column, EntityType, FieldTables, Table};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Input for the get_schema tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetSchemaInput {
    /// Only return tables owned by this entity type (e.g. "node")
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Omit column lists. Default: false
    #[serde(default)]
    pub tables_only: bool,
}

/// Output from the get_schema tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetSchemaOutput {
    pub tables: Vec<TableOutput>,
    pub entity_types: Vec<EntityTypeOutput>,
    /// Entity types skipped because their metadata could not be loaded
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable_entity_types: Vec<String>,
    pub table_count: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableOutput {
    pub name: String,
    /// base, data, revision, revision_data, field_data, field_revision or other
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnOutput>,
    /// False when the table is declared by entity metadata but missing from the database
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnOutput {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

impl From<&Column> for ColumnOutput {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            nullable: !column.not_null,
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EntityTypeOutput {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_data_table: Option<String>,
    /// Bundle id -> label
    pub bundles: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_tables: Vec<FieldTablesOutput>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct FieldTablesOutput {
    pub field_name: String,
    pub data_table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_table: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<String>,
}

impl From<&FieldTables> for FieldTablesOutput {
    fn from(field: &FieldTables) -> Self {
        Self {
            field_name: field.field_name.clone(),
            data_table: field.data_table.clone(),
            revision_table: field.revision_table.clone(),
            bundles: field.bundles.clone(),
        }
    }
}

impl From<&EntityType> for EntityTypeOutput {
    fn from(entity: &EntityType) -> Self {
        Self {
            id: entity.id.clone(),
            label: entity.label.clone(),
            base_table: entity.base_table.clone(),
            data_table: entity.data_table.clone(),
            revision_table: entity.revision_table.clone(),
            revision_data_table: entity.revision_data_table.clone(),
            bundles: entity.bundles.clone(),
            field_tables: entity.field_tables.iter().map(Into::into).collect(),
        }
    }
}

impl TableOutput {
    fn from_table(table: &Table, with_columns: bool) -> Self {
        Self {
            name: table.name.clone(),
            kind: table.kind.as_str().to_string(),
            entity_type: table.entity_type.clone(),
            field_name: table.field_name.clone(),
            columns: if with_columns {
                table.columns.iter().map(Into::into).collect()
            } else {
                Vec::new()
            },
            exists: table.exists,
            reflection_error: table.reflection_error.clone(),
        }
    }
}

impl GetSchemaOutput {
    /// Shape a catalog for output, optionally restricted to one entity type.
    pub fn from_catalog(catalog: &Catalog, input: &GetSchemaInput) -> ExplorerResult<Self> {
        let entity_filter = input.entity_type.as_deref();
        if let Some(id) = entity_filter {
            if catalog.entity_type(id).is_none() {
                return Err(ExplorerError::entity_type_not_found(id));
            }
        }

        let tables: Vec<TableOutput> = catalog
            .tables
            .values()
            .filter(|t| entity_filter.is_none() || t.entity_type.as_deref() == entity_filter)
            .map(|t| TableOutput::from_table(t, !input.tables_only))
            .collect();
        let entity_types = catalog
            .entity_types
            .values()
            .filter(|e| entity_filter.is_none_or(|id| e.id == id))
            .map(Into::into)
            .collect();

        Ok(Self {
            table_count: tables.len(),
            tables,
            entity_types,
            unavailable_entity_types: catalog.unavailable_entity_types.clone(),
        })
    }
}

/// Handler for schema catalog requests.
pub struct SchemaToolHandler {
    explorer: Arc<Explorer>,
}

impl SchemaToolHandler {
    pub fn new(explorer: Arc<Explorer>) -> Self {
        Self { explorer }
    }

    /// Handle the get_schema tool call.
    pub async fn get_schema(&self, input: GetSchemaInput) -> ExplorerResult<GetSchemaOutput> {
        let catalog = self.explorer.catalog().await?;
        let output = GetSchemaOutput::from_catalog(&catalog, &input)?;

        info!(
            entity_type = ?input.entity_type,
            tables = output.table_count,
            entity_types = output.entity_types.len(),
            "Schema catalog built"
        );

        Ok(output)
    }
}
