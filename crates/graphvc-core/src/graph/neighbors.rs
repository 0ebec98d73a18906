//! Neighbor derivation for the node detail view.
//!
//! A selected node's connections are found by a linear scan over the edge
//! list. Edges pointing at nodes missing from the graph are skipped.

use serde::Serialize;

use super::model::{GraphNode, RelationshipType, VCGraph};

/// Which way an edge points relative to the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Outgoing => "->",
            Self::Incoming => "<-",
        }
    }
}

/// A node reachable from the selected node over one edge.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedNode<'a> {
    pub node: &'a GraphNode,
    pub relationship: RelationshipType,
    pub direction: Direction,
}

/// List the nodes connected to `node_id`, in edge order.
pub fn connected_nodes<'a>(graph: &'a VCGraph, node_id: &str) -> Vec<ConnectedNode<'a>> {
    if graph.node(node_id).is_none() {
        return Vec::new();
    }

    graph
        .edges
        .iter()
        .filter_map(|edge| {
            let (direction, other) = if edge.source == node_id {
                (Direction::Outgoing, &edge.target)
            } else if edge.target == node_id {
                (Direction::Incoming, &edge.source)
            } else {
                return None;
            };

            graph.node(other).map(|node| ConnectedNode {
                node,
                relationship: edge.relationship,
                direction,
            })
        })
        .collect()
}
