//! GraphVC history store
//!
//! One row per generated graph for signed-in users. The graph contents
//! live in the graph store under the row's session id.

pub mod migrations;
pub mod pool;
pub mod queries;

pub use migrations::run_migrations;
pub use pool::{DbError, DbPool, DbResult};
pub use queries::graphs;

/// Open (or create) the history database and bring its schema up to date.
pub fn init_pool(path: &std::path::Path) -> DbResult<DbPool> {
    let pool = DbPool::open(path)?;
    run_migrations(&pool)?;
    Ok(pool)
}
