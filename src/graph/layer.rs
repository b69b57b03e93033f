//! Layer: a typed, rule-constrained subgraph
//!
//! All seven layers share this container. What differs between them is
//! carried by a [`LayerPolicy`]: the allowed node types, the default path
//! depth, the traversal direction for path search, and the semantic rules.

use super::edge::{Edge, EdgeId, EdgeType, InterLayerEdge, Sign};
use super::engine::{MultiplexError, MultiplexResult, RecordKind};
use super::node::{Node, NodeId, NodeType};
use super::validity::{edge_types_for_layer, validate_edge};
use crate::query::{Direction, PathOptions, PathResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Names of the seven layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerName {
    Capability,
    IssueSurface,
    PolicyArea,
    Jurisdiction,
    Procedural,
    Coalition,
    InformationFlow,
}

impl LayerName {
    pub const ALL: [LayerName; 7] = [
        LayerName::Capability,
        LayerName::IssueSurface,
        LayerName::PolicyArea,
        LayerName::Jurisdiction,
        LayerName::Procedural,
        LayerName::Coalition,
        LayerName::InformationFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerName::Capability => "CAPABILITY",
            LayerName::IssueSurface => "ISSUE_SURFACE",
            LayerName::PolicyArea => "POLICY_AREA",
            LayerName::Jurisdiction => "JURISDICTION",
            LayerName::Procedural => "PROCEDURAL",
            LayerName::Coalition => "COALITION",
            LayerName::InformationFlow => "INFORMATION_FLOW",
        }
    }

    /// The policy governing this layer
    pub fn policy(&self) -> &'static dyn LayerPolicy {
        crate::layers::policy_for(*self)
    }

    pub fn allowed_node_types(&self) -> &'static [NodeType] {
        self.policy().allowed_node_types()
    }
}

impl std::fmt::Display for LayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LayerName {
    type Err = MultiplexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerName::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| MultiplexError::LayerNotFound(s.to_string()))
    }
}

/// Per-variant behavior of a layer
pub trait LayerPolicy: Send + Sync {
    fn name(&self) -> LayerName;

    fn allowed_node_types(&self) -> &'static [NodeType];

    /// Path depth used when a search does not set one
    fn default_max_depth(&self) -> usize;

    /// Which edges a path search may follow out of a node
    fn traversal(&self) -> Direction {
        Direction::Outgoing
    }

    /// Variant-specific rule checks; never fails
    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue>;
}

/// One semantic rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Short rule name, e.g. "capability_exogenous"
    pub rule: String,
    /// Offending node or edge id
    pub id: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(rule: impl Into<String>, id: impl ToString, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            id: id.to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of a semantic validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether any issue names `id`
    pub fn mentions(&self, id: &str) -> bool {
        self.errors.iter().any(|e| e.id == id)
    }
}

/// Edge counts by sign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignBalance {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Structural summary of one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetrics {
    pub layer: LayerName,
    pub node_count: usize,
    pub edge_count: usize,
    /// `2E / (N(N-1))`, treating the layer as undirected
    pub density: f64,
    pub average_degree: f64,
    pub sign_balance: SignBalance,
    pub clustering_coefficient: f64,
}

/// Default cap on the number of paths one search returns
pub const DEFAULT_MAX_PATHS: usize = 1000;

/// A typed, filtered subgraph
#[derive(Debug, Clone)]
pub struct Layer {
    name: LayerName,
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, Edge>,
    inter_layer_edges: HashMap<String, InterLayerEdge>,
    allowed_node_types: HashSet<NodeType>,
    allowed_edge_types: HashSet<EdgeType>,
    default_max_depth: usize,
    max_paths: usize,
}

impl Layer {
    /// Create an empty layer with its policy's membership sets
    pub fn new(name: LayerName) -> Self {
        let policy = name.policy();
        Self {
            name,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            inter_layer_edges: HashMap::new(),
            allowed_node_types: policy.allowed_node_types().iter().copied().collect(),
            allowed_edge_types: edge_types_for_layer(name).into_iter().collect(),
            default_max_depth: policy.default_max_depth(),
            max_paths: DEFAULT_MAX_PATHS,
        }
    }

    /// Override the default path depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.default_max_depth = depth;
        self
    }

    /// Override the default path-count cap
    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn name(&self) -> LayerName {
        self.name
    }

    pub fn policy(&self) -> &'static dyn LayerPolicy {
        self.name.policy()
    }

    pub fn default_max_depth(&self) -> usize {
        self.default_max_depth
    }

    pub fn max_paths(&self) -> usize {
        self.max_paths
    }

    pub fn traversal(&self) -> Direction {
        self.policy().traversal()
    }

    pub fn allows_node_type(&self, node_type: NodeType) -> bool {
        self.allowed_node_types.contains(&node_type)
    }

    pub fn allows_edge_type(&self, edge_type: EdgeType) -> bool {
        self.allowed_edge_types.contains(&edge_type)
    }

    pub fn allowed_node_types(&self) -> &HashSet<NodeType> {
        &self.allowed_node_types
    }

    pub fn allowed_edge_types(&self) -> &HashSet<EdgeType> {
        &self.allowed_edge_types
    }

    // === Mutation ===

    /// Insert or overwrite a node by id
    pub fn add_node(&mut self, node: Node) -> MultiplexResult<()> {
        let node_type = node.node_type();
        if !self.allows_node_type(node_type) {
            return Err(MultiplexError::TypeNotAllowed {
                kind: RecordKind::Node,
                id: node.id.to_string(),
                type_name: node_type.to_string(),
                layer: self.name,
            });
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert or overwrite an edge by id
    pub fn add_edge(&mut self, edge: Edge) -> MultiplexResult<()> {
        self.check_edge(&edge)?;
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// The checks `add_edge` performs, without inserting
    pub fn check_edge(&self, edge: &Edge) -> MultiplexResult<()> {
        if edge.layer != self.name {
            return Err(MultiplexError::LayerMismatch {
                edge_id: edge.id.to_string(),
                declared: edge.layer,
                layer: self.name,
            });
        }
        if !self.allows_edge_type(edge.edge_type) {
            return Err(MultiplexError::TypeNotAllowed {
                kind: RecordKind::Edge,
                id: edge.id.to_string(),
                type_name: edge.edge_type.to_string(),
                layer: self.name,
            });
        }
        Ok(())
    }

    /// Remove a node and every edge and coupling that references it
    ///
    /// Returns whether the node existed.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let existed = self.nodes.remove(id).is_some();
        self.edges.retain(|_, e| !e.touches(id));
        self.inter_layer_edges.retain(|_, c| &c.node_id != id);
        existed
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        self.edges.remove(id)
    }

    pub(crate) fn register_coupling(&mut self, coupling: InterLayerEdge) {
        self.inter_layer_edges.insert(coupling.id.clone(), coupling);
    }

    // === Accessors ===

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn inter_layer_edges(&self) -> impl Iterator<Item = &InterLayerEdge> {
        self.inter_layer_edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids in sorted order
    pub fn node_ids(&self) -> Vec<&NodeId> {
        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();
        ids
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.node_type() == node_type)
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Edges whose source is `id`
    pub fn outgoing_edges(&self, id: &NodeId) -> Vec<&Edge> {
        self.sorted_edges(|e| &e.source_id == id)
    }

    /// Edges whose target is `id`
    pub fn incoming_edges(&self, id: &NodeId) -> Vec<&Edge> {
        self.sorted_edges(|e| &e.target_id == id)
    }

    /// Edges touching `id` at either end
    pub fn adjacent_edges(&self, id: &NodeId) -> Vec<&Edge> {
        self.sorted_edges(|e| e.touches(id))
    }

    pub fn edges_of_type(&self, edge_type: EdgeType) -> Vec<&Edge> {
        self.sorted_edges(|e| e.edge_type == edge_type)
    }

    pub fn edges_with_sign(&self, sign: Sign) -> Vec<&Edge> {
        self.sorted_edges(|e| e.sign == sign)
    }

    fn sorted_edges(&self, keep: impl Fn(&Edge) -> bool) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges.values().filter(|e| keep(e)).collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }

    /// Number of edges incident to `id`
    pub fn degree(&self, id: &NodeId) -> usize {
        self.edges.values().filter(|e| e.touches(id)).count()
    }

    /// Undirected neighbor sets, ignoring self-loops
    pub fn undirected_adjacency(&self) -> HashMap<&NodeId, HashSet<&NodeId>> {
        let mut adjacency: HashMap<&NodeId, HashSet<&NodeId>> = HashMap::new();
        for edge in self.edges.values() {
            if edge.is_self_loop() {
                continue;
            }
            adjacency
                .entry(&edge.source_id)
                .or_default()
                .insert(&edge.target_id);
            adjacency
                .entry(&edge.target_id)
                .or_default()
                .insert(&edge.source_id);
        }
        adjacency
    }

    // === Analysis ===

    pub fn compute_metrics(&self) -> LayerMetrics {
        let n = self.nodes.len();
        let e = self.edges.len();

        let density = if n > 1 {
            (2 * e) as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };
        let average_degree = if n > 0 { (2 * e) as f64 / n as f64 } else { 0.0 };

        let mut sign_balance = SignBalance::default();
        for edge in self.edges.values() {
            match edge.sign {
                Sign::Positive => sign_balance.positive += 1,
                Sign::Negative => sign_balance.negative += 1,
                Sign::Neutral => sign_balance.neutral += 1,
            }
        }

        LayerMetrics {
            layer: self.name,
            node_count: n,
            edge_count: e,
            density,
            average_degree,
            sign_balance,
            clustering_coefficient: self.clustering_coefficient(),
        }
    }

    fn clustering_coefficient(&self) -> f64 {
        let adjacency = self.undirected_adjacency();
        let mut total = 0.0;
        let mut counted = 0usize;

        for neighbors in adjacency.values() {
            let k = neighbors.len();
            if k < 2 {
                continue;
            }
            let list: Vec<&&NodeId> = neighbors.iter().collect();
            let mut closed = 0usize;
            for i in 0..list.len() {
                for j in (i + 1)..list.len() {
                    let linked = adjacency
                        .get(*list[i])
                        .map_or(false, |set| set.contains(*list[j]));
                    if linked {
                        closed += 1;
                    }
                }
            }
            let possible = k * (k - 1) / 2;
            total += closed as f64 / possible as f64;
            counted += 1;
        }

        if counted == 0 {
            0.0
        } else {
            total / counted as f64
        }
    }

    /// Run the layer's semantic rules plus the shared structural checks
    pub fn validate_semantics(&self) -> ValidationReport {
        let mut issues = Vec::new();

        let mut edges: Vec<&Edge> = self.edges.values().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        for edge in edges {
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !self.nodes.contains_key(endpoint) {
                    issues.push(ValidationIssue::new(
                        "dangling_endpoint",
                        &edge.id,
                        format!("edge {} references missing node {}", edge.id, endpoint),
                    ));
                }
            }
            for violation in validate_edge(edge) {
                issues.push(ValidationIssue::new(
                    "edge_validity",
                    &edge.id,
                    violation.to_string(),
                ));
            }
        }

        issues.extend(self.policy().validate_semantics(self));
        ValidationReport::from_issues(issues)
    }

    /// Enumerate simple paths from `from` to `to` inside this layer
    ///
    /// Unset options fall back to the layer's depth and path-count defaults
    /// and to its traversal direction.
    pub fn find_paths(&self, from: &NodeId, to: &NodeId, options: &PathOptions) -> PathResult {
        crate::query::path::enumerate(self, from, to, options)
    }
}
