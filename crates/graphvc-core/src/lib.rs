//! GraphVC Core Library
//!
//! Graph model and client-side logic for GraphVC: the generation API
//! client and its error taxonomy, trial gating, API-key storage,
//! neighbor navigation and export.

pub mod api;
pub mod apikey;
pub mod error;
pub mod export;
pub mod graph;
pub mod input;
pub mod storage;
pub mod trial;

pub use error::{GraphvcError, GraphvcResult};
pub use graph::model::{EntityType, GraphEdge, GraphNode, NodeProperties, RelationshipType, VCGraph};
