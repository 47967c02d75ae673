//! JSON manifest backed metadata provider.
//!
//! ```json
//! {
//!   "entity_types": [
//!     {
//!       "id": "node",
//!       "label": "Content",
//!       "base_table": "node",
//!       "data_table": "node_field_data",
//!       "revision_table": "node_revision",
//!       "revision_data_table": "node_field_revision",
//!       "bundles": { "article": "Article" },
//!       "fields": [
//!         {
//!           "name": "body",
//!           "has_dedicated_table": true,
//!           "dedicated_data_table": "node__body",
//!           "dedicated_revision_table": "node_revision__body",
//!           "bundles": ["article"]
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Unknown keys (for example a field `label` or `type`) are ignored.

use super::EntityMetadataProvider;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{EntityType, FieldStorage};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    entity_types: Vec<ManifestEntityType>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntityType {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    base_table: Option<String>,
    #[serde(default)]
    data_table: Option<String>,
    #[serde(default)]
    revision_table: Option<String>,
    #[serde(default)]
    revision_data_table: Option<String>,
    #[serde(default)]
    bundles: BTreeMap<String, String>,
    #[serde(default)]
    fields: Vec<FieldStorage>,
}

#[derive(Debug, Clone)]
struct Entry {
    entity_type: EntityType,
    fields: Vec<FieldStorage>,
}

/// Serves entity metadata loaded once from a manifest. Manifest order is kept.
#[derive(Debug, Clone, Default)]
pub struct ManifestMetadataProvider {
    entries: Vec<Entry>,
}

impl ManifestMetadataProvider {
    /// Provider with no entity types.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> ExplorerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExplorerError::invalid_input(format!(
                "Cannot read entity metadata manifest '{}': {}",
                path.display(),
                e
            ))
        })?;
        let provider = Self::from_json(&json)?;
        if provider.is_empty() {
            warn!(path = %path.display(), "Entity metadata manifest declares no entity types");
        } else {
            info!(
                path = %path.display(),
                entity_types = provider.len(),
                "Loaded entity metadata manifest"
            );
        }
        Ok(provider)
    }

    pub fn from_json(json: &str) -> ExplorerResult<Self> {
        let manifest: Manifest = serde_json::from_str(json).map_err(|e| {
            ExplorerError::invalid_input(format!("Invalid entity metadata manifest: {}", e))
        })?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(manifest.entity_types.len());
        for raw in manifest.entity_types {
            let id = raw.id.trim().to_string();
            if id.is_empty() {
                return Err(ExplorerError::invalid_input(
                    "Entity type with an empty id in manifest",
                ));
            }
            if !seen.insert(id.clone()) {
                return Err(ExplorerError::invalid_input(format!(
                    "Duplicate entity type '{}' in manifest",
                    id
                )));
            }

            let entity_type = EntityType {
                label: raw.label.unwrap_or_else(|| id.clone()),
                id,
                base_table: raw.base_table,
                data_table: raw.data_table,
                revision_table: raw.revision_table,
                revision_data_table: raw.revision_data_table,
                bundles: raw.bundles,
                field_tables: Vec::new(),
            };
            entries.push(Entry {
                entity_type,
                fields: raw.fields,
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.entity_type.id == id)
    }
}

#[async_trait]
impl EntityMetadataProvider for ManifestMetadataProvider {
    async fn list_entity_types(&self) -> ExplorerResult<Vec<EntityType>> {
        Ok(self
            .entries
            .iter()
            .map(|e| e.entity_type.clone())
            .collect())
    }

    async fn get_entity_type(&self, id: &str) -> ExplorerResult<EntityType> {
        self.entry(id)
            .map(|e| e.entity_type.clone())
            .ok_or_else(|| ExplorerError::entity_type_not_found(id))
    }

    async fn list_field_storage(&self, entity_type_id: &str) -> ExplorerResult<Vec<FieldStorage>> {
        self.entry(entity_type_id)
            .map(|e| e.fields.clone())
            .ok_or_else(|| {
                ExplorerError::metadata_unavailable(entity_type_id, "not present in manifest")
            })
    }
}
