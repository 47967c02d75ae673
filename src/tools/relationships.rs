//! Relationship graph tool.

use crate::error::ExplorerResult;
use crate::explorer::Explorer;
use crate::models::{RelationshipEdge, RelationshipGraph, RelationshipNode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the get_relationships tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetRelationshipsInput {
    /// Restrict the graph to one entity type (e.g. "node")
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Only include field tables attached to this bundle (e.g. "article")
    #[serde(default)]
    pub bundle: Option<String>,
}

/// Output from the get_relationships tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetRelationshipsOutput {
    pub nodes: Vec<NodeOutput>,
    /// In construction order
    pub edges: Vec<EdgeOutput>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct NodeOutput {
    /// Table name
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EdgeOutput {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl From<RelationshipNode> for NodeOutput {
    fn from(node: RelationshipNode) -> Self {
        Self {
            kind: node.kind.as_str().to_string(),
            id: node.id,
            label: node.label,
            entity_type: node.entity_type,
            field_name: node.field_name,
        }
    }
}

impl From<RelationshipEdge> for EdgeOutput {
    fn from(edge: RelationshipEdge) -> Self {
        Self {
            kind: edge.kind.as_str().to_string(),
            source: edge.source,
            target: edge.target,
            label: edge.label,
            field_name: edge.field_name,
        }
    }
}

impl From<RelationshipGraph> for GetRelationshipsOutput {
    fn from(graph: RelationshipGraph) -> Self {
        Self {
            nodes: graph.nodes.into_iter().map(Into::into).collect(),
            edges: graph.edges.into_iter().map(Into::into).collect(),
        }
    }
}

/// Handler for relationship graph requests.
pub struct RelationshipToolHandler {
    explorer: Arc<Explorer>,
}

impl RelationshipToolHandler {
    pub fn new(explorer: Arc<Explorer>) -> Self {
        Self { explorer }
    }

    /// Handle the get_relationships tool call.
    pub async fn get_relationships(
        &self,
        input: GetRelationshipsInput,
    ) -> ExplorerResult<GetRelationshipsOutput> {
        let graph = self
            .explorer
            .relationships(input.entity_type.as_deref(), input.bundle.as_deref())
            .await?;

        info!(
            entity_type = ?input.entity_type,
            bundle = ?input.bundle,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Relationship graph built"
        );

        Ok(graph.into())
    }
}
