//! Route handlers.

pub mod generate;
pub mod graphs;
pub mod health;
pub mod usage;
