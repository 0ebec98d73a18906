//! Neo4j schema initialization.

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use crate::GraphClient;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE INDEX entity_session_id IF NOT EXISTS FOR (n:Entity) ON (n.session_id)",
];

/// Create indexes. Safe to run on every startup.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        client.execute(Query::new(statement.to_string())).await?;
    }

    info!("Neo4j schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}
