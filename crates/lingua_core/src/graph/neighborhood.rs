//! One-hop neighborhood extraction around a focal concept.
//!
//! # Responsibility
//! - Build the induced subgraph of a focal concept, its outgoing refs and
//!   every concept that refers back to it.
//!
//! # Invariants
//! - An unknown focal id yields an empty graph.
//! - Incoming refs are scanned even though links are symmetric, so
//!   hand-edited documents with one-sided refs still render correctly.
//! - One directed edge per stored ref entry; a mutual link renders as two
//!   opposite edges.

use crate::model::document::{ConceptId, Document};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Which ref pass produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefDirection {
    /// Focal concept lists the neighbor in its own `refs`.
    Outgoing,
    /// Neighbor lists the focal concept in its `refs`.
    Incoming,
}

/// Node payload handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborhoodNode {
    pub label: String,
    pub is_focal: bool,
}

/// Directed edge handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborhoodEdge {
    pub from: ConceptId,
    pub to: ConceptId,
    pub direction: RefDirection,
}

/// Abstract node/edge structure for layout and rasterization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NeighborhoodGraph {
    /// Keyed by concept id; ordered so layout input is stable.
    pub nodes: BTreeMap<ConceptId, NeighborhoodNode>,
    pub edges: Vec<NeighborhoodEdge>,
}

impl NeighborhoodGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the focal node id, if any.
    pub fn focal_id(&self) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, node)| node.is_focal)
            .map(|(id, _)| id.as_str())
    }

    /// Returns whether a `from -> to` edge is present.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.from == from && edge.to == to)
    }
}

/// Computes the one-hop neighborhood of `focal_id`.
///
/// Refs pointing at ids no longer in the document still appear as nodes,
/// labelled with the raw id, so broken links stay visible.
pub fn neighborhood(doc: &Document, focal_id: &str) -> NeighborhoodGraph {
    let Some((_, focal)) = doc.find_concept(focal_id) else {
        debug!("event=neighborhood module=graph status=skip reason=focal_not_found");
        return NeighborhoodGraph::default();
    };

    let mut graph = NeighborhoodGraph::default();
    graph.nodes.insert(
        focal.id.clone(),
        NeighborhoodNode {
            label: focal.term.clone(),
            is_focal: true,
        },
    );

    for target in &focal.refs {
        if target == &focal.id {
            continue;
        }
        let label = doc
            .find_concept(target)
            .map_or_else(|| target.clone(), |(_, concept)| concept.term.clone());
        graph
            .nodes
            .entry(target.clone())
            .or_insert(NeighborhoodNode {
                label,
                is_focal: false,
            });
        graph.edges.push(NeighborhoodEdge {
            from: focal.id.clone(),
            to: target.clone(),
            direction: RefDirection::Outgoing,
        });
    }

    for source in doc.concepts().filter(|concept| concept.id != focal.id) {
        for _ in source.refs.iter().filter(|value| *value == &focal.id) {
            graph
                .nodes
                .entry(source.id.clone())
                .or_insert_with(|| NeighborhoodNode {
                    label: source.term.clone(),
                    is_focal: false,
                });
            graph.edges.push(NeighborhoodEdge {
                from: source.id.clone(),
                to: focal.id.clone(),
                direction: RefDirection::Incoming,
            });
        }
    }

    debug!(
        "event=neighborhood module=graph status=ok nodes={} edges={}",
        graph.nodes.len(),
        graph.edges.len()
    );
    graph
}
