//! Query types and result structures

use crate::graph::{EdgeId, LayerName, NodeId};
use serde::{Deserialize, Serialize};

/// Direction for edge traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow outgoing edges (source -> target)
    #[default]
    Outgoing,
    /// Follow incoming edges (target <- source)
    Incoming,
    /// Follow outgoing edges, plus undirected edges from either end
    Both,
}

/// A simple path inside one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPath {
    /// Node ids from source to target
    pub nodes: Vec<NodeId>,
    /// Edge ids, one fewer than nodes
    pub edges: Vec<EdgeId>,
}

impl LayerPath {
    /// Number of edges traversed
    pub fn hops(&self) -> usize {
        self.edges.len()
    }
}

/// Result of a bounded path enumeration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub paths: Vec<LayerPath>,
    /// The path-count cap was reached; more paths may exist
    pub truncated: bool,
    /// The search stopped on a cancellation request
    pub cancelled: bool,
}

impl PathResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Fewest-hop path, first found on ties
    pub fn shortest(&self) -> Option<&LayerPath> {
        self.paths.iter().min_by_key(|p| p.hops())
    }
}

/// How a cross-layer step was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", content = "id", rename_all = "snake_case")]
pub enum Transition {
    /// Within-layer edge
    Edge(EdgeId),
    /// Coupling to the same node in another layer
    Coupling(String),
}

/// One `(node, layer)` state on a cross-layer path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLayerStep {
    pub node_id: NodeId,
    pub layer: LayerName,
    /// None for the starting state
    pub via: Option<Transition>,
}

/// A path through `(node, layer)` states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLayerPath {
    pub steps: Vec<CrossLayerStep>,
}

impl CrossLayerPath {
    pub fn hops(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Number of coupling transitions on the path
    pub fn layer_switches(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.via, Some(Transition::Coupling(_))))
            .count()
    }

    pub fn node_ids(&self) -> Vec<&NodeId> {
        self.steps.iter().map(|s| &s.node_id).collect()
    }
}

/// Result of a cross-layer path search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossLayerResult {
    pub paths: Vec<CrossLayerPath>,
    pub truncated: bool,
    pub cancelled: bool,
}

impl CrossLayerResult {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}
