//! Database queries.

pub mod graphs;
