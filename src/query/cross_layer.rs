//! Path search across layers through coupling edges

use super::index::EdgeIndex;
use super::types::{CrossLayerPath, CrossLayerResult, CrossLayerStep, Transition};
use crate::cancel::{is_cancelled, CancellationToken};
use crate::graph::{InterLayerEdge, LayerName, MultiplexNetwork, NodeId};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Options for [`MultiplexNetwork::find_cross_layer_paths`]
#[derive(Debug, Clone, Default)]
pub struct CrossLayerOptions {
    /// Maximum transitions (edges plus couplings) on a path
    pub max_depth: Option<usize>,
    /// Layers the search may enter; all layers when unset
    pub allowed_layers: Option<BTreeSet<LayerName>>,
    pub max_paths: Option<usize>,
    pub cancel: Option<CancellationToken>,
}

impl CrossLayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn allowed_layers(mut self, layers: impl IntoIterator<Item = LayerName>) -> Self {
        self.allowed_layers = Some(layers.into_iter().collect());
        self
    }

    pub fn max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = Some(max_paths);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

type State = (NodeId, LayerName);

struct CrossLayerSearch<'a> {
    network: &'a MultiplexNetwork,
    target: &'a NodeId,
    allowed: BTreeSet<LayerName>,
    max_depth: usize,
    max_paths: usize,
    cancel: Option<&'a CancellationToken>,
    indexes: HashMap<LayerName, EdgeIndex<'a>>,
    couplings: HashMap<&'a NodeId, Vec<&'a InterLayerEdge>>,
}

pub(crate) fn search(
    network: &MultiplexNetwork,
    from: &NodeId,
    to: &NodeId,
    options: &CrossLayerOptions,
) -> CrossLayerResult {
    let allowed: BTreeSet<LayerName> = options
        .allowed_layers
        .clone()
        .unwrap_or_else(|| LayerName::ALL.into_iter().collect());

    let indexes = allowed
        .iter()
        .map(|name| (*name, EdgeIndex::build(network.layer(*name).edges())))
        .collect();

    let mut couplings: HashMap<&NodeId, Vec<&InterLayerEdge>> = HashMap::new();
    for coupling in network.inter_layer_edges() {
        couplings.entry(&coupling.node_id).or_default().push(coupling);
    }
    for list in couplings.values_mut() {
        list.sort_by(|a, b| a.id.cmp(&b.id));
    }

    let paths_config = &network.config().paths;
    let search = CrossLayerSearch {
        network,
        target: to,
        allowed,
        max_depth: options.max_depth.unwrap_or(paths_config.cross_layer_max_depth),
        max_paths: options.max_paths.unwrap_or(paths_config.max_paths),
        cancel: options.cancel.as_ref(),
        indexes,
        couplings,
    };

    let seeds: Vec<LayerName> = search
        .allowed
        .iter()
        .copied()
        .filter(|l| network.layer(*l).contains_node(from))
        .collect();
    debug!(%from, %to, seeds = seeds.len(), max_depth = search.max_depth, "cross-layer search");

    let mut result = CrossLayerResult::default();
    if search.max_paths == 0 {
        result.truncated = true;
        return result;
    }

    for layer in seeds {
        let mut steps = vec![CrossLayerStep {
            node_id: from.clone(),
            layer,
            via: None,
        }];
        let mut on_path: HashSet<State> = HashSet::from([(from.clone(), layer)]);
        search.walk(from, layer, &mut steps, &mut on_path, &mut result);
        if result.truncated || result.cancelled {
            break;
        }
    }

    if result.truncated {
        warn!(cap = search.max_paths, "cross-layer path cap reached");
    }
    if result.cancelled {
        warn!(found = result.paths.len(), "cross-layer search cancelled");
    }
    debug!(found = result.paths.len(), "cross-layer search finished");
    result
}

impl CrossLayerSearch<'_> {
    fn walk(
        &self,
        node: &NodeId,
        layer: LayerName,
        steps: &mut Vec<CrossLayerStep>,
        on_path: &mut HashSet<State>,
        result: &mut CrossLayerResult,
    ) {
        if is_cancelled(self.cancel) {
            result.cancelled = true;
            return;
        }
        if node == self.target {
            result.paths.push(CrossLayerPath {
                steps: steps.clone(),
            });
            if result.paths.len() >= self.max_paths {
                result.truncated = true;
            }
            return;
        }
        if steps.len() > self.max_depth {
            return;
        }

        for (next, next_layer, via) in self.moves(node, layer) {
            let state = (next.clone(), next_layer);
            if on_path.contains(&state) {
                continue;
            }
            on_path.insert(state.clone());
            steps.push(CrossLayerStep {
                node_id: next.clone(),
                layer: next_layer,
                via: Some(via),
            });

            self.walk(&next, next_layer, steps, on_path, result);

            steps.pop();
            on_path.remove(&state);
            if result.truncated || result.cancelled {
                return;
            }
        }
    }

    /// Within-layer edges first, then couplings into other allowed layers
    fn moves(&self, node: &NodeId, layer: LayerName) -> Vec<(NodeId, LayerName, Transition)> {
        let mut moves = Vec::new();

        if let Some(index) = self.indexes.get(&layer) {
            let direction = self.network.layer(layer).traversal();
            for (edge, next) in index.steps(node, direction) {
                moves.push((next.clone(), layer, Transition::Edge(edge.id.clone())));
            }
        }

        for coupling in self.couplings.get(node).into_iter().flatten() {
            let Some(other) = coupling.other_layer(layer) else {
                continue;
            };
            if self.allowed.contains(&other) && self.network.layer(other).contains_node(node) {
                moves.push((node.clone(), other, Transition::Coupling(coupling.id.clone())));
            }
        }
        moves
    }
}
