//! Process-local graph store for development and tests.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use graphvc_core::VCGraph;

use crate::repository::{can_read, GraphRepository};

/// Sessions kept before the oldest is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1_000;

#[derive(Default)]
struct Sessions {
    graphs: HashMap<String, (String, VCGraph)>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

/// Holds at most `max_sessions` graphs and evicts the oldest beyond that.
pub struct InMemoryGraphRepository {
    sessions: RwLock<Sessions>,
    max_sessions: usize,
}

impl Default for InMemoryGraphRepository {
    fn default() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }
}

impl InMemoryGraphRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.graphs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    async fn persist_graph(&self, session_id: &str, graph: &VCGraph, user_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| anyhow!("graph store lock poisoned"))?;
        let previous = sessions
            .graphs
            .insert(session_id.to_string(), (user_id.to_string(), graph.clone()));
        if previous.is_none() {
            sessions.order.push_back(session_id.to_string());
        }

        while sessions.graphs.len() > self.max_sessions {
            let Some(oldest) = sessions.order.pop_front() else {
                break;
            };
            sessions.graphs.remove(&oldest);
            tracing::debug!(session_id = %oldest, "Evicted in-memory graph");
        }
        Ok(())
    }

    async fn get_graph_by_session(&self, session_id: &str, user_id: Option<&str>) -> Result<Option<VCGraph>> {
        let sessions = self.sessions.read().map_err(|_| anyhow!("graph store lock poisoned"))?;
        let Some((owner, graph)) = sessions.graphs.get(session_id) else {
            return Ok(None);
        };
        if graph.is_empty() {
            return Ok(None);
        }
        if let Some(user_id) = user_id {
            if !can_read(Some(owner.as_str()), user_id) {
                return Ok(None);
            }
        }
        Ok(Some(graph.clone()))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| anyhow!("graph store lock poisoned"))?;
        if sessions.graphs.remove(session_id).is_some() {
            sessions.order.retain(|id| id != session_id);
        }
        Ok(())
    }
}
