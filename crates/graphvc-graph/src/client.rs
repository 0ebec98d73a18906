//! Neo4j connection client.

use anyhow::{Context, Result};
use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;

/// Configuration for connecting to Neo4j.
#[derive(Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            max_connections: 16,
        }
    }
}

impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

/// Client for Neo4j graph operations.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect and verify the server answers.
    ///
    /// `Graph::connect` only builds a lazy pool, so a `RETURN 1` ping forces
    /// the bolt handshake and surfaces an unreachable server at startup.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Run queries in a single transaction. Nothing is kept unless every
    /// query succeeds and the commit goes through.
    pub async fn execute_all(&self, queries: Vec<Query>) -> Result<()> {
        let mut txn = self.graph.start_txn().await.context("Failed to start Neo4j transaction")?;

        if let Err(e) = txn.run_queries(queries).await {
            if let Err(rollback) = txn.rollback().await {
                tracing::debug!(error = %rollback, "Neo4j rollback failed");
            }
            return Err(e).context("Neo4j transaction failed");
        }

        txn.commit().await.context("Neo4j commit failed")?;
        Ok(())
    }

    /// Execute a Cypher query and collect its rows.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await.context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.context("Neo4j stream failed")? {
            rows.push(row);
        }
        Ok(rows)
    }
}
