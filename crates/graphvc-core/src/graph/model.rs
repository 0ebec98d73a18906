//! Graph domain models.
//!
//! These types are the wire shape shared by the extraction model output,
//! the HTTP API and the graph store.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entity classification for graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum EntityType {
    Investor,
    Project,
    Round,
    Narrative,
    Person,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        Self::Investor,
        Self::Project,
        Self::Round,
        Self::Narrative,
        Self::Person,
    ];

    /// Parse from string. Matching is case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "investor" => Some(Self::Investor),
            "project" => Some(Self::Project),
            "round" => Some(Self::Round),
            "narrative" => Some(Self::Narrative),
            "person" => Some(Self::Person),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investor => "Investor",
            Self::Project => "Project",
            Self::Round => "Round",
            Self::Narrative => "Narrative",
            Self::Person => "Person",
        }
    }
}

/// Relationship kinds between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Investor led a Round
    Led,
    /// Investor invested in a Project or Round
    InvestedIn,
    /// Investor co-invested with another Investor in the same round
    CoInvested,
    /// Project raised a Round
    Raised,
    /// Person founded a Project
    Founded,
    /// Person is a partner at an Investor
    PartnersAt,
    /// Investor focuses on a Narrative
    FocusesOn,
    /// Project is classified as a Narrative
    ClassifiedAs,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 8] = [
        Self::Led,
        Self::InvestedIn,
        Self::CoInvested,
        Self::Raised,
        Self::Founded,
        Self::PartnersAt,
        Self::FocusesOn,
        Self::ClassifiedAs,
    ];

    /// Parse from the wire name (e.g. `INVESTED_IN`).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LED" => Some(Self::Led),
            "INVESTED_IN" => Some(Self::InvestedIn),
            "CO_INVESTED" => Some(Self::CoInvested),
            "RAISED" => Some(Self::Raised),
            "FOUNDED" => Some(Self::Founded),
            "PARTNERS_AT" => Some(Self::PartnersAt),
            "FOCUSES_ON" => Some(Self::FocusesOn),
            "CLASSIFIED_AS" => Some(Self::ClassifiedAs),
            _ => None,
        }
    }

    /// Convert to the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Led => "LED",
            Self::InvestedIn => "INVESTED_IN",
            Self::CoInvested => "CO_INVESTED",
            Self::Raised => "RAISED",
            Self::Founded => "FOUNDED",
            Self::PartnersAt => "PARTNERS_AT",
            Self::FocusesOn => "FOCUSES_ON",
            Self::ClassifiedAs => "CLASSIFIED_AS",
        }
    }
}

/// Entity-specific properties.
///
/// Investor: aum, stage_focus, chain_focus. Project: token_ticker, chain,
/// category. Round: amount_usd, stage, date. Person: title, firm.
/// Narrative: description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NodeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeProperties {
    /// Present properties as (name, value) pairs, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let fields: [(&'static str, &Option<String>); 12] = [
            ("aum", &self.aum),
            ("stage_focus", &self.stage_focus),
            ("chain_focus", &self.chain_focus),
            ("token_ticker", &self.token_ticker),
            ("chain", &self.chain),
            ("category", &self.category),
            ("amount_usd", &self.amount_usd),
            ("stage", &self.stage),
            ("date", &self.date),
            ("title", &self.title),
            ("firm", &self.firm),
            ("description", &self.description),
        ];

        fields
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// A graph entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphNode {
    /// Unique slug identifier derived from entity name, e.g. `paradigm-capital`
    pub id: String,
    /// Display name, e.g. `Paradigm Capital`
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub properties: NodeProperties,
}

/// A directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphEdge {
    /// Source node id (must match a node id in the graph)
    pub source: String,
    /// Target node id (must match a node id in the graph)
    pub target: String,
    pub relationship: RelationshipType,
}

/// VC ecosystem knowledge graph with typed entities and relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VCGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl VCGraph {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// True when the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Drop edges whose endpoints are not nodes of this graph.
    ///
    /// Returns the number of edges removed.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.edges.len();
        let kept: Vec<GraphEdge> = self
            .edges
            .iter()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .cloned()
            .collect();
        self.edges = kept;
        before - self.edges.len()
    }

    /// Count nodes per entity type, in `EntityType::ALL` order.
    pub fn type_counts(&self) -> Vec<(EntityType, usize)> {
        EntityType::ALL
            .iter()
            .map(|t| (*t, self.nodes.iter().filter(|n| n.entity_type == *t).count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
