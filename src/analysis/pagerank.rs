//! PageRank over the supra-graph of (node, layer) states
//!
//! A walker at node `u` in layer `L` spends `1 - inter_layer_weight` of its
//! step on `u`'s neighbors in `L` (undirected adjacency, split evenly) and
//! `inter_layer_weight` on crossing a coupling of `u` to another layer (split
//! by coupling strength). When one of the two options is unavailable the
//! whole step goes to the other; a state with neither spreads evenly over
//! all states. Scores are summed per node and normalized to 1.

use crate::config::PageRankConfig;
use crate::graph::{LayerName, MultiplexNetwork, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRankResult {
    /// Per-node score; sums to 1 unless the network is empty
    pub scores: BTreeMap<NodeId, f64>,
    /// Highest scores first, at most `top_n` entries
    pub top: Vec<(NodeId, f64)>,
    pub iterations: usize,
    pub converged: bool,
}

type State = (NodeId, LayerName);

pub fn multiplex_pagerank(network: &MultiplexNetwork, config: &PageRankConfig) -> PageRankResult {
    let mut states: Vec<State> = Vec::new();
    for layer in network.layers() {
        for id in layer.node_ids() {
            states.push((id.clone(), layer.name()));
        }
    }
    let size = states.len();
    if size == 0 {
        return PageRankResult {
            scores: BTreeMap::new(),
            top: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }
    let index: HashMap<&State, usize> = states.iter().enumerate().map(|(i, s)| (s, i)).collect();
    let transitions = build_transitions(network, &states, &index, config.inter_layer_weight);

    let uniform = 1.0 / size as f64;
    let mut rank = vec![uniform; size];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;
        let mut next = vec![(1.0 - config.damping) * uniform; size];
        let mut dangling = 0.0;
        for (i, out) in transitions.iter().enumerate() {
            if out.is_empty() {
                dangling += rank[i];
                continue;
            }
            for (j, p) in out {
                next[*j] += config.damping * rank[i] * p;
            }
        }
        if dangling > 0.0 {
            let share = config.damping * dangling * uniform;
            for value in &mut next {
                *value += share;
            }
        }

        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < config.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(iterations, "multiplex pagerank hit the iteration cap");
    }

    let mut scores: BTreeMap<NodeId, f64> = BTreeMap::new();
    for ((id, _), value) in states.iter().zip(&rank) {
        *scores.entry(id.clone()).or_insert(0.0) += value;
    }
    let total: f64 = scores.values().sum();
    if total > 0.0 {
        for value in scores.values_mut() {
            *value /= total;
        }
    }

    let mut top: Vec<(NodeId, f64)> = scores.iter().map(|(id, s)| (id.clone(), *s)).collect();
    top.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    top.truncate(config.top_n);

    debug!(states = size, iterations, converged, "multiplex pagerank computed");
    PageRankResult {
        scores,
        top,
        iterations,
        converged,
    }
}

/// Outgoing transition probabilities per state
fn build_transitions(
    network: &MultiplexNetwork,
    states: &[State],
    index: &HashMap<&State, usize>,
    inter_layer_weight: f64,
) -> Vec<Vec<(usize, f64)>> {
    let inter_weight = inter_layer_weight.clamp(0.0, 1.0);
    let adjacency: BTreeMap<LayerName, _> = network
        .layers()
        .map(|layer| (layer.name(), layer.undirected_adjacency()))
        .collect();

    let mut couplings: HashMap<&NodeId, Vec<(LayerName, LayerName, f64)>> = HashMap::new();
    for coupling in network.inter_layer_edges() {
        couplings.entry(&coupling.node_id).or_default().push((
            coupling.source_layer,
            coupling.target_layer,
            coupling.coupling_strength,
        ));
    }

    states
        .iter()
        .map(|(id, layer)| {
            let intra: Vec<usize> = adjacency
                .get(layer)
                .and_then(|adj| adj.get(id))
                .into_iter()
                .flatten()
                .filter_map(|n| index.get(&((*n).clone(), *layer)).copied())
                .collect();

            let mut inter: Vec<(usize, f64)> = Vec::new();
            for (a, b, strength) in couplings.get(id).into_iter().flatten() {
                let other = if a == layer {
                    *b
                } else if b == layer {
                    *a
                } else {
                    continue;
                };
                if let Some(j) = index.get(&(id.clone(), other)) {
                    inter.push((*j, *strength));
                }
            }
            let inter_total: f64 = inter.iter().map(|(_, s)| s).sum();
            if inter_total <= 0.0 {
                inter.clear();
            }

            let (intra_mass, inter_mass) = match (intra.is_empty(), inter.is_empty()) {
                (true, true) => return Vec::new(),
                (false, true) => (1.0, 0.0),
                (true, false) => (0.0, 1.0),
                (false, false) => (1.0 - inter_weight, inter_weight),
            };

            let mut out: Vec<(usize, f64)> = Vec::with_capacity(intra.len() + inter.len());
            if intra_mass > 0.0 {
                let p = intra_mass / intra.len() as f64;
                out.extend(intra.into_iter().map(|j| (j, p)));
            }
            if inter_mass > 0.0 {
                out.extend(inter.into_iter().map(|(j, s)| (j, inter_mass * s / inter_total)));
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, EdgeType, Node, NodeAttributes, NodeType};

    fn member(id: &str) -> Node {
        Node::new(id, id, NodeAttributes::empty(NodeType::Member))
    }

    #[test]
    fn test_empty_network_has_no_scores() {
        let result = multiplex_pagerank(&MultiplexNetwork::new(), &PageRankConfig::default());
        assert!(result.scores.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn test_scores_sum_to_one_and_hub_leads() {
        let mut network = MultiplexNetwork::new();
        for id in ["hub", "a", "b", "c"] {
            network.add_node_to_layers(member(id)).unwrap();
        }
        for leaf in ["a", "b", "c"] {
            network
                .add_edge(create_edge(EdgeType::AlliesWith, &member("hub"), &member(leaf)))
                .unwrap();
        }
        network.auto_generate_inter_layer_edges(1.0);

        let result = multiplex_pagerank(&network, &PageRankConfig::default());
        let total: f64 = result.scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(result.converged);
        assert_eq!(result.top[0].0, NodeId::from("hub"));
        let a = result.scores[&NodeId::from("a")];
        let b = result.scores[&NodeId::from("b")];
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_top_n_truncates() {
        let mut network = MultiplexNetwork::new();
        for id in ["a", "b", "c"] {
            network.add_node_to_layers(member(id)).unwrap();
        }
        let config = PageRankConfig {
            top_n: 2,
            ..PageRankConfig::default()
        };
        let result = multiplex_pagerank(&network, &config);
        assert_eq!(result.top.len(), 2);
        assert_eq!(result.scores.len(), 3);
    }
}
