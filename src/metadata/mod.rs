//! Entity metadata.
//!
//! The catalog builder learns which tables belong to which entity type through
//! the [`EntityMetadataProvider`] trait. [`ManifestMetadataProvider`] serves
//! that metadata from a JSON manifest exported by the host application.

mod manifest;

pub use manifest::ManifestMetadataProvider;

use crate::error::ExplorerResult;
use crate::models::{EntityType, FieldStorage};
use async_trait::async_trait;

/// Source of entity-type, bundle and field-storage definitions.
#[async_trait]
pub trait EntityMetadataProvider: Send + Sync {
    /// All entity types, in a stable order.
    async fn list_entity_types(&self) -> ExplorerResult<Vec<EntityType>>;

    /// Fails with `EntityTypeNotFound` for an unknown id.
    async fn get_entity_type(&self, id: &str) -> ExplorerResult<EntityType>;

    /// Storage definitions of every field of `entity_type_id`.
    async fn list_field_storage(&self, entity_type_id: &str) -> ExplorerResult<Vec<FieldStorage>>;
}
