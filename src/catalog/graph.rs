//! Relationship graph construction.
//!
//! The graph is derived from the catalog alone. Nodes are keyed by table name
//! and emitted once; edges keep construction order and are only emitted when
//! both endpoints are nodes.

use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{
    Catalog, EdgeKind, EntityType, RelationshipEdge, RelationshipGraph, RelationshipNode,
    TableKind,
};
use std::collections::HashSet;
use tracing::debug;

/// Build the table relationship graph.
///
/// `entity_type` restricts the graph to one entity type and fails with
/// [`ExplorerError::EntityTypeNotFound`] if the catalog does not know it.
/// `bundle` restricts field tables to those attached to that bundle.
pub fn build_graph(
    catalog: &Catalog,
    entity_type: Option<&str>,
    bundle: Option<&str>,
) -> ExplorerResult<RelationshipGraph> {
    let in_scope: Vec<&EntityType> = match entity_type {
        Some(id) => vec![
            catalog
                .entity_type(id)
                .ok_or_else(|| ExplorerError::entity_type_not_found(id))?,
        ],
        None => catalog.entity_types.values().collect(),
    };

    let mut graph = GraphBuilder::new(catalog);
    for entity in in_scope {
        graph.add_entity_type(entity, bundle);
    }

    let graph = graph.finish();
    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        entity_type = ?entity_type,
        bundle = ?bundle,
        "Built relationship graph"
    );
    Ok(graph)
}

struct GraphBuilder<'a> {
    catalog: &'a Catalog,
    seen: HashSet<String>,
    graph: RelationshipGraph,
}

impl<'a> GraphBuilder<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            seen: HashSet::new(),
            graph: RelationshipGraph::default(),
        }
    }

    fn finish(self) -> RelationshipGraph {
        self.graph
    }

    fn add_entity_type(&mut self, entity: &EntityType, bundle: Option<&str>) {
        let base = entity.base();
        let data = entity.data();
        let revision = entity.revision();
        let revision_data = entity.revision_data();

        for (table, kind) in entity.storage_tables() {
            self.node(table, table.to_string(), kind, &entity.id, None);
        }

        if let (Some(base), Some(data)) = (base, data) {
            self.edge(base, data, EdgeKind::BaseToData, "Data", None);
        }
        if let (Some(base), Some(revision)) = (base, revision) {
            self.edge(base, revision, EdgeKind::BaseToRevision, "Revision", None);
        }
        if let (Some(revision), Some(revision_data)) = (revision, revision_data) {
            self.edge(
                revision,
                revision_data,
                EdgeKind::RevisionToData,
                "Revision Data",
                None,
            );
        }

        let current_anchor = data.or(base);
        let revision_anchor = revision_data.or(revision);

        for field in &entity.field_tables {
            if let Some(bundle) = bundle {
                if !field.applies_to_bundle(bundle) {
                    continue;
                }
            }
            let name = field.field_name.as_str();

            self.node(
                &field.data_table,
                format!("{} ({})", field.data_table, name),
                TableKind::FieldData,
                &entity.id,
                Some(name),
            );
            if let Some(anchor) = current_anchor {
                self.edge(
                    anchor,
                    &field.data_table,
                    EdgeKind::EntityToField,
                    name,
                    Some(name),
                );
            }

            if let Some(revision_table) = &field.revision_table {
                self.node(
                    revision_table,
                    format!("{} ({})", revision_table, name),
                    TableKind::FieldRevision,
                    &entity.id,
                    Some(name),
                );
                if let Some(anchor) = revision_anchor {
                    self.edge(
                        anchor,
                        revision_table,
                        EdgeKind::RevisionToField,
                        name,
                        Some(name),
                    );
                }
            }
        }
    }

    /// Emit a node once. Ownership follows the cataloged table when it has one.
    fn node(
        &mut self,
        id: &str,
        label: String,
        kind: TableKind,
        entity_type: &str,
        field_name: Option<&str>,
    ) {
        if !self.seen.insert(id.to_string()) {
            return;
        }

        let owned = self
            .catalog
            .table(id)
            .filter(|t| t.kind.is_entity_storage())
            .and_then(|t| t.entity_type.as_deref().map(|owner| (t, owner)));
        let node = match owned {
            Some((table, owner)) => RelationshipNode {
                id: id.to_string(),
                label,
                kind: table.kind,
                entity_type: owner.to_string(),
                field_name: table.field_name.clone(),
            },
            None => RelationshipNode {
                id: id.to_string(),
                label,
                kind,
                entity_type: entity_type.to_string(),
                field_name: field_name.map(String::from),
            },
        };
        self.graph.nodes.push(node);
    }

    fn edge(
        &mut self,
        source: &str,
        target: &str,
        kind: EdgeKind,
        label: &str,
        field_name: Option<&str>,
    ) {
        if !self.seen.contains(source) || !self.seen.contains(target) {
            return;
        }
        self.graph.edges.push(RelationshipEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            label: label.to_string(),
            field_name: field_name.map(String::from),
        });
    }
}
