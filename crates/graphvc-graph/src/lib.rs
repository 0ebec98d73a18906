//! # GraphVC Graph
//!
//! Stores generated graphs in Neo4j. Every node and relationship carries
//! the session id of the generation that produced it, and nodes record
//! the user who created them.

pub mod client;
pub mod memory;
pub mod repository;
pub mod schema;

pub use client::{GraphClient, GraphConfig};
pub use memory::{InMemoryGraphRepository, DEFAULT_MAX_SESSIONS};
pub use repository::{can_read, GraphRepository, Neo4jGraphRepository};
pub use schema::initialize_schema;
