//! Relationship graph data models.

use crate::models::TableKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipNode {
    /// Table name
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: TableKind,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    BaseToData,
    BaseToRevision,
    RevisionToData,
    EntityToField,
    RevisionToField,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseToData => "base_to_data",
            Self::BaseToRevision => "base_to_revision",
            Self::RevisionToData => "revision_to_data",
            Self::EntityToField => "entity_to_field",
            Self::RevisionToField => "revision_to_field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

/// Directed table relationship graph. Edges keep construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<RelationshipNode>,
    pub edges: Vec<RelationshipEdge>,
}

impl RelationshipGraph {
    pub fn node(&self, id: &str) -> Option<&RelationshipNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_ids(&self) -> std::collections::BTreeSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a RelationshipEdge> {
        self.edges.iter().filter(move |e| e.source == source)
    }
}
