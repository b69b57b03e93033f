//! MultiplexNetwork: the seven layers plus the couplings between them

use super::edge::{Edge, InterLayerEdge};
use super::engine::{MultiplexError, MultiplexResult};
use super::layer::{Layer, LayerMetrics, LayerName, ValidationReport};
use super::node::{Node, NodeId};
use crate::config::EngineConfig;
use crate::layers::{
    CapabilityView, CoalitionView, InformationFlowView, IssueSurfaceView, JurisdictionView,
    PolicyAreaView, ProceduralView,
};
use crate::query::{CrossLayerOptions, CrossLayerResult};
use crate::storage::NetworkSnapshot;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Network-wide structural summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplexMetrics {
    pub layers: BTreeMap<LayerName, LayerMetrics>,
    /// Number of layers each node belongs to
    pub participation: BTreeMap<NodeId, usize>,
    /// Participation divided by the total layer count
    pub versatility: BTreeMap<NodeId, f64>,
    /// Distinct node identities across all layers
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_inter_layer_edges: usize,
    pub average_versatility: f64,
}

/// Every layer's validation report plus the overall verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkValidation {
    pub valid: bool,
    pub layers: BTreeMap<LayerName, ValidationReport>,
}

impl NetworkValidation {
    pub fn error_count(&self) -> usize {
        self.layers.values().map(|r| r.errors.len()).sum()
    }
}

/// The multiplex coordinator
///
/// Owns one [`Layer`] per [`LayerName`] and the global coupling map. A node
/// identity is shared by every layer that holds it; couplings join those
/// appearances pairwise.
#[derive(Debug, Clone)]
pub struct MultiplexNetwork {
    layers: BTreeMap<LayerName, Layer>,
    inter_layer_edges: HashMap<String, InterLayerEdge>,
    config: EngineConfig,
}

impl Default for MultiplexNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiplexNetwork {
    /// Create a network with seven empty layers and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a network whose layer defaults come from `config`
    pub fn with_config(config: EngineConfig) -> Self {
        let layers = LayerName::ALL
            .into_iter()
            .map(|name| {
                let mut layer = Layer::new(name).with_max_paths(config.paths.max_paths);
                if let Some(depth) = config.paths.layer_max_depth.get(&name) {
                    layer = layer.with_max_depth(*depth);
                }
                (name, layer)
            })
            .collect();
        Self {
            layers,
            inter_layer_edges: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Layers ===

    pub fn layer(&self, name: LayerName) -> &Layer {
        // All seven layers are created in with_config and never removed
        &self.layers[&name]
    }

    pub(crate) fn layer_mut(&mut self, name: LayerName) -> &mut Layer {
        self.layers
            .entry(name)
            .or_insert_with(|| Layer::new(name))
    }

    /// Look a layer up by its wire name, e.g. "COALITION"
    pub fn get_layer(&self, name: &str) -> MultiplexResult<&Layer> {
        let name: LayerName = name.parse()?;
        Ok(self.layer(name))
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn inter_layer_edges(&self) -> impl Iterator<Item = &InterLayerEdge> {
        self.inter_layer_edges.values()
    }

    pub fn inter_layer_edge_count(&self) -> usize {
        self.inter_layer_edges.len()
    }

    // === Mutation ===

    /// Insert `node` into every layer that allows its type
    ///
    /// Returns the layers it now belongs to. Fails with `IdConflict` when the
    /// id is already held by a node of another type; nothing is written then.
    pub fn add_node_to_layers(&mut self, node: Node) -> MultiplexResult<Vec<LayerName>> {
        let node_type = node.node_type();
        if let Some(existing) = self.find_node(&node.id) {
            if existing.node_type() != node_type {
                return Err(MultiplexError::IdConflict {
                    node_id: node.id.clone(),
                    existing: existing.node_type(),
                    requested: node_type,
                });
            }
        }

        let targets: Vec<LayerName> = LayerName::ALL
            .into_iter()
            .filter(|name| self.layer(*name).allows_node_type(node_type))
            .collect();
        for name in &targets {
            self.layer_mut(*name).add_node(node.clone())?;
        }
        debug!(node = %node.id, %node_type, layers = targets.len(), "node added");
        Ok(targets)
    }

    /// Insert `edge` into the layer it declares
    pub fn add_edge(&mut self, edge: Edge) -> MultiplexResult<()> {
        let layer = edge.layer;
        let id = edge.id.clone();
        self.layer_mut(layer).add_edge(edge)?;
        debug!(edge = %id, %layer, "edge added");
        Ok(())
    }

    /// Remove a node from every layer, with its edges and couplings
    ///
    /// Returns whether any layer held it.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let mut existed = false;
        for layer in self.layers.values_mut() {
            existed |= layer.remove_node(id);
        }
        self.inter_layer_edges.retain(|_, c| &c.node_id != id);
        debug!(node = %id, existed, "node removed");
        existed
    }

    /// Register a coupling between two layers holding the same node
    pub fn add_inter_layer_edge(&mut self, coupling: InterLayerEdge) -> MultiplexResult<()> {
        if coupling.source_layer == coupling.target_layer {
            return Err(MultiplexError::SelfCoupling {
                node_id: coupling.node_id,
                layer: coupling.source_layer,
            });
        }
        for name in [coupling.source_layer, coupling.target_layer] {
            if !self.layer(name).contains_node(&coupling.node_id) {
                return Err(MultiplexError::NodeNotInLayer {
                    node_id: coupling.node_id,
                    layer: name,
                });
            }
        }

        debug!(
            node = %coupling.node_id,
            source = %coupling.source_layer,
            target = %coupling.target_layer,
            "coupling added"
        );
        self.layer_mut(coupling.source_layer)
            .register_coupling(coupling.clone());
        self.layer_mut(coupling.target_layer)
            .register_coupling(coupling.clone());
        self.inter_layer_edges.insert(coupling.id.clone(), coupling);
        Ok(())
    }

    /// Couple every multi-layer node across each pair of its layers
    ///
    /// Pairs that already have a coupling for that node are skipped, so a
    /// second run creates nothing. Returns the number of couplings created.
    pub fn auto_generate_inter_layer_edges(&mut self, coupling_strength: f64) -> usize {
        let existing: BTreeSet<(NodeId, (LayerName, LayerName))> = self
            .inter_layer_edges
            .values()
            .map(|c| (c.node_id.clone(), c.layer_pair()))
            .collect();

        let mut created = Vec::new();
        for (id, layers) in self.membership() {
            for (i, a) in layers.iter().enumerate() {
                for b in &layers[i + 1..] {
                    if !existing.contains(&(id.clone(), (*a, *b))) {
                        created.push(InterLayerEdge::new(id.clone(), *a, *b, coupling_strength));
                    }
                }
            }
        }

        let count = created.len();
        for coupling in created {
            self.layer_mut(coupling.source_layer)
                .register_coupling(coupling.clone());
            self.layer_mut(coupling.target_layer)
                .register_coupling(coupling.clone());
            self.inter_layer_edges.insert(coupling.id.clone(), coupling);
        }
        debug!(created = count, total = self.inter_layer_edges.len(), "couplings generated");
        count
    }

    /// `auto_generate_inter_layer_edges` at the configured default strength
    pub fn auto_couple(&mut self) -> usize {
        let strength = self.config.coupling.default_strength;
        self.auto_generate_inter_layer_edges(strength)
    }

    // === Lookup ===

    /// The node record for `id`, from the first layer holding it
    pub fn find_node(&self, id: &NodeId) -> Option<&Node> {
        self.layers.values().find_map(|layer| layer.get_node(id))
    }

    /// Layers containing `id`, in layer order
    pub fn get_node_layers(&self, id: &NodeId) -> Vec<LayerName> {
        self.layers
            .values()
            .filter(|layer| layer.contains_node(id))
            .map(Layer::name)
            .collect()
    }

    /// Every node identity with the layers it belongs to
    pub fn membership(&self) -> BTreeMap<NodeId, Vec<LayerName>> {
        let mut membership: BTreeMap<NodeId, Vec<LayerName>> = BTreeMap::new();
        for layer in self.layers.values() {
            for node in layer.nodes() {
                membership
                    .entry(node.id.clone())
                    .or_default()
                    .push(layer.name());
            }
        }
        for layers in membership.values_mut() {
            layers.sort();
        }
        membership
    }

    /// Distinct node identities across all layers
    pub fn node_ids(&self) -> BTreeSet<&NodeId> {
        self.layers
            .values()
            .flat_map(|layer| layer.nodes().map(|n| &n.id))
            .collect()
    }

    // === Queries ===

    /// Paths that may switch layers through couplings
    pub fn find_cross_layer_paths(
        &self,
        from: &NodeId,
        to: &NodeId,
        options: &CrossLayerOptions,
    ) -> CrossLayerResult {
        crate::query::cross_layer::search(self, from, to, options)
    }

    pub fn compute_metrics(&self) -> MultiplexMetrics {
        let layers: BTreeMap<LayerName, LayerMetrics> = self
            .layers
            .iter()
            .map(|(name, layer)| (*name, layer.compute_metrics()))
            .collect();

        let participation: BTreeMap<NodeId, usize> = self
            .membership()
            .into_iter()
            .map(|(id, layers)| (id, layers.len()))
            .collect();
        let total = LayerName::ALL.len() as f64;
        let versatility: BTreeMap<NodeId, f64> = participation
            .iter()
            .map(|(id, count)| (id.clone(), *count as f64 / total))
            .collect();
        let average_versatility = if versatility.is_empty() {
            0.0
        } else {
            versatility.values().sum::<f64>() / versatility.len() as f64
        };

        MultiplexMetrics {
            total_nodes: participation.len(),
            total_edges: self.layers.values().map(Layer::edge_count).sum(),
            total_inter_layer_edges: self.inter_layer_edges.len(),
            layers,
            participation,
            versatility,
            average_versatility,
        }
    }

    /// Fraction of all layers containing `id`
    pub fn calculate_versatility(&self, id: &NodeId) -> f64 {
        self.get_node_layers(id).len() as f64 / LayerName::ALL.len() as f64
    }

    /// Mean normalized degree over the layers containing `id`
    ///
    /// A layer with fewer than two nodes contributes 0.
    pub fn calculate_multiplex_centrality(&self, id: &NodeId) -> f64 {
        let holding: Vec<&Layer> = self
            .layers
            .values()
            .filter(|layer| layer.contains_node(id))
            .collect();
        if holding.is_empty() {
            return 0.0;
        }
        let sum: f64 = holding
            .iter()
            .map(|layer| {
                let n = layer.node_count();
                if n > 1 {
                    layer.degree(id) as f64 / (n - 1) as f64
                } else {
                    0.0
                }
            })
            .sum();
        sum / holding.len() as f64
    }

    /// Run every layer's semantic rules
    pub fn validate_all(&self) -> NetworkValidation {
        let layers: BTreeMap<LayerName, ValidationReport> = self
            .layers
            .iter()
            .map(|(name, layer)| (*name, layer.validate_semantics()))
            .collect();
        let valid = layers.values().all(|r| r.valid);
        let validation = NetworkValidation { valid, layers };
        debug!(valid, errors = validation.error_count(), "network validated");
        validation
    }

    // === Typed views ===

    pub fn capability(&self) -> CapabilityView<'_> {
        CapabilityView {
            layer: self.layer(LayerName::Capability),
        }
    }

    pub fn issue_surface(&self) -> IssueSurfaceView<'_> {
        IssueSurfaceView {
            layer: self.layer(LayerName::IssueSurface),
        }
    }

    pub fn policy_area(&self) -> PolicyAreaView<'_> {
        PolicyAreaView {
            layer: self.layer(LayerName::PolicyArea),
        }
    }

    pub fn jurisdiction(&self) -> JurisdictionView<'_> {
        JurisdictionView {
            layer: self.layer(LayerName::Jurisdiction),
        }
    }

    pub fn procedural(&self) -> ProceduralView<'_> {
        ProceduralView {
            layer: self.layer(LayerName::Procedural),
        }
    }

    pub fn coalition(&self) -> CoalitionView<'_> {
        CoalitionView {
            layer: self.layer(LayerName::Coalition),
        }
    }

    pub fn information_flow(&self) -> InformationFlowView<'_> {
        InformationFlowView {
            layer: self.layer(LayerName::InformationFlow),
        }
    }

    // === Persistence boundary ===

    /// Serialize the current state: each node once, everything sorted by id
    pub fn snapshot(&self) -> NetworkSnapshot {
        let mut nodes: BTreeMap<&NodeId, &Node> = BTreeMap::new();
        for layer in self.layers.values() {
            for node in layer.nodes() {
                nodes.entry(&node.id).or_insert(node);
            }
        }

        let mut edges: Vec<Edge> = self
            .layers
            .values()
            .flat_map(|layer| layer.edges().cloned())
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        let mut inter_layer_edges: Vec<InterLayerEdge> =
            self.inter_layer_edges.values().cloned().collect();
        inter_layer_edges.sort_by(|a, b| a.id.cmp(&b.id));

        NetworkSnapshot {
            nodes: nodes.into_values().cloned().collect(),
            edges,
            inter_layer_edges,
            taken_at: Utc::now(),
        }
    }

    /// Build a network from a snapshot
    ///
    /// Nodes go in first, then edges, then couplings. The first structural
    /// failure aborts the load and the partial network is dropped.
    pub fn load(snapshot: &NetworkSnapshot, config: EngineConfig) -> MultiplexResult<Self> {
        let mut network = Self::with_config(config);
        for node in &snapshot.nodes {
            network.add_node_to_layers(node.clone())?;
        }
        for edge in &snapshot.edges {
            network.add_edge(edge.clone())?;
        }
        for coupling in &snapshot.inter_layer_edges {
            network.add_inter_layer_edge(coupling.clone())?;
        }
        Ok(network)
    }
}
