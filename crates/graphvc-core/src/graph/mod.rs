//! VC knowledge graph: entities, relationships and navigation.

pub mod model;
pub mod neighbors;

pub use model::{EntityType, GraphEdge, GraphNode, NodeProperties, RelationshipType, VCGraph};
pub use neighbors::{connected_nodes, ConnectedNode, Direction};
