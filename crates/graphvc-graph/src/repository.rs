//! Session-scoped graph persistence.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use neo4rs::Query;

use graphvc_core::{EntityType, GraphEdge, GraphNode, NodeProperties, RelationshipType, VCGraph};

use crate::client::GraphClient;

/// Graphs created before ownership was recorded carry one of these.
const LEGACY_OWNERS: &[&str] = &["anonymous", "dev-user"];

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Storage for generated graphs, keyed by session id.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    async fn persist_graph(&self, session_id: &str, graph: &VCGraph, user_id: &str) -> Result<()>;

    /// `None` when the session has no nodes, or when `user_id` may not read it.
    async fn get_graph_by_session(&self, session_id: &str, user_id: Option<&str>) -> Result<Option<VCGraph>>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Whether `user_id` may read a graph created by `created_by`.
pub fn can_read(created_by: Option<&str>, user_id: &str) -> bool {
    match created_by {
        None => true,
        Some(owner) => owner == user_id || LEGACY_OWNERS.contains(&owner),
    }
}

/// Connection loss and expired sessions are worth one more try.
pub(crate) fn is_transient(err: &anyhow::Error) -> bool {
    let text = format!("{:#}", err).to_lowercase();
    [
        "connection",
        "broken pipe",
        "session expired",
        "sessionexpired",
        "service unavailable",
        "serviceunavailable",
        "timed out",
        "io error",
    ]
    .iter()
    .any(|marker| text.contains(marker))
}

async fn with_retry<T, F, Fut>(op: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Err(e) if is_transient(&e) => {
            tracing::warn!(op, error = %e, "Transient Neo4j failure, retrying once");
            tokio::time::sleep(RETRY_DELAY).await;
            f().await
        }
        other => other,
    }
}

/// Statements that replace everything stored under `session_id` with
/// `graph`. They run as one transaction and start by clearing the session,
/// so a retried write never leaves duplicate nodes behind.
fn write_statements(session_id: &str, graph: &VCGraph, user_id: &str) -> Result<Vec<Query>> {
    let mut statements = vec![Query::new(
        "MATCH (n:Entity {session_id: $session_id}) DETACH DELETE n".to_string(),
    )
    .param("session_id", session_id)];

    // Parallel lists keep every value a parameter; nothing is interpolated.
    let ids: Vec<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    let labels: Vec<String> = graph.nodes.iter().map(|n| n.label.clone()).collect();
    let types: Vec<String> = graph.nodes.iter().map(|n| n.entity_type.as_str().to_string()).collect();
    let properties = graph
        .nodes
        .iter()
        .map(|n| serde_json::to_string(&n.properties))
        .collect::<Result<Vec<String>, _>>()?;

    statements.push(
        Query::new(
            "UNWIND range(0, size($ids) - 1) AS i
             CREATE (n:Entity {
                 id: $ids[i],
                 label: $labels[i],
                 type: $types[i],
                 properties: $properties[i],
                 session_id: $session_id,
                 created_by: $user_id
             })"
            .to_string(),
        )
        .param("ids", ids)
        .param("labels", labels)
        .param("types", types)
        .param("properties", properties)
        .param("session_id", session_id)
        .param("user_id", user_id),
    );

    if graph.edges.is_empty() {
        return Ok(statements);
    }

    let sources: Vec<String> = graph.edges.iter().map(|e| e.source.clone()).collect();
    let targets: Vec<String> = graph.edges.iter().map(|e| e.target.clone()).collect();
    let relationships: Vec<String> = graph.edges.iter().map(|e| e.relationship.as_str().to_string()).collect();

    statements.push(
        Query::new(
            "UNWIND range(0, size($sources) - 1) AS i
             MATCH (s:Entity {id: $sources[i], session_id: $session_id})
             MATCH (t:Entity {id: $targets[i], session_id: $session_id})
             CREATE (s)-[:RELATES_TO {type: $relationships[i], session_id: $session_id}]->(t)"
                .to_string(),
        )
        .param("sources", sources)
        .param("targets", targets)
        .param("relationships", relationships)
        .param("session_id", session_id),
    );

    Ok(statements)
}

/// Neo4j-backed repository.
#[derive(Clone)]
pub struct Neo4jGraphRepository {
    client: GraphClient,
}

impl Neo4jGraphRepository {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    async fn write(&self, session_id: &str, graph: &VCGraph, user_id: &str) -> Result<()> {
        self.client.execute_all(write_statements(session_id, graph, user_id)?).await
    }

    async fn read(&self, session_id: &str, user_id: Option<&str>) -> Result<Option<VCGraph>> {
        let node_rows = self
            .client
            .query(
                Query::new(
                    "MATCH (n:Entity {session_id: $session_id})
                     RETURN n.id AS id, n.label AS label, n.type AS type,
                            n.properties AS properties, n.created_by AS created_by"
                        .to_string(),
                )
                .param("session_id", session_id),
            )
            .await?;

        if node_rows.is_empty() {
            return Ok(None);
        }

        if let Some(user_id) = user_id {
            let owner: Option<String> = node_rows[0].get("created_by").ok();
            if !can_read(owner.as_deref(), user_id) {
                tracing::info!(session_id, "Graph read denied: not the owner");
                return Ok(None);
            }
        }

        let mut nodes = Vec::with_capacity(node_rows.len());
        for row in &node_rows {
            let id: String = row.get("id").unwrap_or_default();
            let type_name: String = row.get("type").unwrap_or_default();
            let Some(entity_type) = EntityType::from_str(&type_name) else {
                tracing::warn!(session_id, node = %id, type_name = %type_name, "Skipping node with unknown type");
                continue;
            };
            let properties = row
                .get::<String>("properties")
                .ok()
                .and_then(|raw| serde_json::from_str::<NodeProperties>(&raw).ok())
                .unwrap_or_default();
            nodes.push(GraphNode {
                label: row.get("label").unwrap_or_else(|_| id.clone()),
                id,
                entity_type,
                properties,
            });
        }

        let edge_rows = self
            .client
            .query(
                Query::new(
                    "MATCH (s:Entity {session_id: $session_id})-[r:RELATES_TO]->(t:Entity)
                     RETURN s.id AS source, t.id AS target, r.type AS relationship"
                        .to_string(),
                )
                .param("session_id", session_id),
            )
            .await?;

        let edges = edge_rows
            .iter()
            .filter_map(|row| {
                let relationship: String = row.get("relationship").ok()?;
                Some(GraphEdge {
                    source: row.get("source").ok()?,
                    target: row.get("target").ok()?,
                    relationship: RelationshipType::from_str(&relationship)?,
                })
            })
            .collect();

        Ok(Some(VCGraph { nodes, edges }))
    }
}

#[async_trait]
impl GraphRepository for Neo4jGraphRepository {
    async fn persist_graph(&self, session_id: &str, graph: &VCGraph, user_id: &str) -> Result<()> {
        with_retry("persist_graph", || self.write(session_id, graph, user_id)).await?;
        tracing::debug!(
            session_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Persisted graph"
        );
        Ok(())
    }

    async fn get_graph_by_session(&self, session_id: &str, user_id: Option<&str>) -> Result<Option<VCGraph>> {
        with_retry("get_graph_by_session", || self.read(session_id, user_id)).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        with_retry("delete_session", || {
            self.client.execute(
                Query::new("MATCH (n:Entity {session_id: $session_id}) DETACH DELETE n".to_string())
                    .param("session_id", session_id),
            )
        })
        .await
    }
}
