//! Catalog data models.
//!
//! A [`Catalog`] is the per-request snapshot of every known table, its columns,
//! and the entity types that own them. It is rebuilt from scratch on each call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A column as reported by the column reflector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Driver-reported type (e.g., "varchar(255)", "TEXT", "int8")
    #[serde(rename = "type")]
    pub data_type: String,
    pub not_null: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, not_null: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null,
        }
    }

    /// True for character, text and binary/blob column families.
    pub fn is_string_like(&self) -> bool {
        is_string_like_type(&self.data_type)
    }
}

/// Classify a declared column type as searchable by substring.
pub fn is_string_like_type(data_type: &str) -> bool {
    let lower = data_type.to_lowercase();
    lower.contains("char")
        || lower.contains("text")
        || lower.contains("clob")
        || lower.contains("blob")
        || lower.contains("binary")
        || lower == "bytea"
        || lower == "string"
}

/// Storage role of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Base,
    Data,
    Revision,
    RevisionData,
    FieldData,
    FieldRevision,
    /// Physical table with no entity-type owner
    Other,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Data => "data",
            Self::Revision => "revision",
            Self::RevisionData => "revision_data",
            Self::FieldData => "field_data",
            Self::FieldRevision => "field_revision",
            Self::Other => "other",
        }
    }

    /// Whether tables of this kind belong to an entity type.
    pub fn is_entity_storage(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    pub columns: Vec<Column>,
    /// False when the reflector reported the table as absent
    pub exists: bool,
    /// Set when column reflection failed; the column list is then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reflection_error: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            entity_type: None,
            field_name: None,
            columns: Vec::new(),
            exists: true,
            reflection_error: None,
        }
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn string_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_string_like())
    }
}

/// Dedicated storage of one configurable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTables {
    pub field_name: String,
    pub data_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_table: Option<String>,
    /// Bundles the field is attached to; empty means all bundles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<String>,
}

impl FieldTables {
    pub fn applies_to_bundle(&self, bundle: &str) -> bool {
        self.bundles.is_empty() || self.bundles.iter().any(|b| b == bundle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub base_table: Option<String>,
    #[serde(default)]
    pub data_table: Option<String>,
    #[serde(default)]
    pub revision_table: Option<String>,
    #[serde(default)]
    pub revision_data_table: Option<String>,
    /// Bundle id -> bundle label
    #[serde(default)]
    pub bundles: BTreeMap<String, String>,
    /// Filled in by the catalog builder
    #[serde(default)]
    pub field_tables: Vec<FieldTables>,
}

impl EntityType {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            base_table: None,
            data_table: None,
            revision_table: None,
            revision_data_table: None,
            bundles: BTreeMap::new(),
            field_tables: Vec::new(),
        }
    }

    pub fn with_base_table(mut self, table: impl Into<String>) -> Self {
        self.base_table = Some(table.into());
        self
    }

    pub fn with_data_table(mut self, table: impl Into<String>) -> Self {
        self.data_table = Some(table.into());
        self
    }

    pub fn with_revision_table(mut self, table: impl Into<String>) -> Self {
        self.revision_table = Some(table.into());
        self
    }

    pub fn with_revision_data_table(mut self, table: impl Into<String>) -> Self {
        self.revision_data_table = Some(table.into());
        self
    }

    pub fn with_bundle(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.bundles.insert(id.into(), label.into());
        self
    }

    pub fn base(&self) -> Option<&str> {
        non_empty(&self.base_table)
    }

    pub fn data(&self) -> Option<&str> {
        non_empty(&self.data_table)
    }

    pub fn revision(&self) -> Option<&str> {
        non_empty(&self.revision_table)
    }

    pub fn revision_data(&self) -> Option<&str> {
        non_empty(&self.revision_data_table)
    }

    /// Storage tiers in recording order, skipping absent tables.
    pub fn storage_tables(&self) -> Vec<(&str, TableKind)> {
        [
            (self.base(), TableKind::Base),
            (self.data(), TableKind::Data),
            (self.revision(), TableKind::Revision),
            (self.revision_data(), TableKind::RevisionData),
        ]
        .into_iter()
        .filter_map(|(name, kind)| name.map(|n| (n, kind)))
        .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Storage definition of one field, as reported by the entity metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStorage {
    pub name: String,
    #[serde(default)]
    pub is_base_field: bool,
    #[serde(default)]
    pub has_dedicated_table: bool,
    #[serde(default)]
    pub dedicated_data_table: Option<String>,
    #[serde(default)]
    pub dedicated_revision_table: Option<String>,
    #[serde(default)]
    pub bundles: Vec<String>,
}

impl FieldStorage {
    /// Dedicated tables for a configurable field, or None if it shares entity storage.
    pub fn dedicated_tables(&self) -> Option<FieldTables> {
        if self.is_base_field || !self.has_dedicated_table {
            return None;
        }
        let data_table = non_empty(&self.dedicated_data_table)?.to_string();
        Some(FieldTables {
            field_name: self.name.clone(),
            data_table,
            revision_table: non_empty(&self.dedicated_revision_table).map(String::from),
            bundles: self.bundles.clone(),
        })
    }
}

/// Snapshot of all tables and entity types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tables: BTreeMap<String, Table>,
    pub entity_types: BTreeMap<String, EntityType>,
    /// Entity types skipped because their metadata could not be loaded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_entity_types: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table unless one with the same name exists. First writer wins.
    pub fn insert_table(&mut self, table: Table) -> bool {
        if self.tables.contains_key(&table.name) {
            return false;
        }
        self.tables.insert(table.name.clone(), table);
        true
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn entity_type(&self, id: &str) -> Option<&EntityType> {
        self.entity_types.get(id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
