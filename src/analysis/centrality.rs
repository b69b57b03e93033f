//! Per-layer and multiplex centrality

use crate::config::PageRankConfig;
use crate::graph::{Layer, LayerName, MultiplexNetwork, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, warn};

const EIGENVECTOR_MAX_ITERATIONS: usize = 1000;
const EIGENVECTOR_TOLERANCE: f64 = 1e-6;

/// How per-layer centralities combine into one multiplex score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityMethod {
    /// Mean over the layers containing the node
    #[default]
    Aggregate,
    /// Largest single-layer value
    Max,
    /// Harmonic mean over layers where the node has a positive value
    Harmonic,
}

/// Centrality profile of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCentralityReport {
    pub node_id: NodeId,
    /// Degree centrality in each layer, 0 where the node is absent
    pub layer_centralities: BTreeMap<LayerName, f64>,
    pub aggregate_centrality: f64,
    pub versatility: f64,
    pub participation_coefficient: f64,
}

/// Every single-layer centrality measure of one layer
///
/// All measures read the layer as undirected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCentralities {
    pub layer: LayerName,
    pub degree: BTreeMap<NodeId, f64>,
    pub betweenness: BTreeMap<NodeId, f64>,
    pub closeness: BTreeMap<NodeId, f64>,
    /// All zeros when power iteration does not converge
    pub eigenvector: BTreeMap<NodeId, f64>,
    pub pagerank: BTreeMap<NodeId, f64>,
}

/// Pearson correlation between layers' degree-centrality vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCorrelation {
    pub layers: Vec<LayerName>,
    /// Row and column order follow `layers`
    pub matrix: Vec<Vec<f64>>,
}

impl LayerCorrelation {
    pub fn get(&self, a: LayerName, b: LayerName) -> Option<f64> {
        let i = self.layers.iter().position(|l| *l == a)?;
        let j = self.layers.iter().position(|l| *l == b)?;
        Some(self.matrix[i][j])
    }
}

fn normalized_degree(layer: &Layer, id: &NodeId) -> f64 {
    let n = layer.node_count();
    if n > 1 && layer.contains_node(id) {
        layer.degree(id) as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

/// `degree / (N - 1)` for every node of the layer
pub fn degree_centrality(layer: &Layer) -> BTreeMap<NodeId, f64> {
    layer
        .node_ids()
        .into_iter()
        .map(|id| (id.clone(), normalized_degree(layer, id)))
        .collect()
}

/// Closeness over the undirected adjacency
///
/// For a node reaching `r - 1` others at total distance `s`, the score is
/// `((r - 1) / s) * ((r - 1) / (N - 1))`, which scales down nodes stuck in
/// small components. Isolated nodes score 0.
pub fn closeness_centrality(layer: &Layer) -> BTreeMap<NodeId, f64> {
    let adjacency = layer.undirected_adjacency();
    let n = layer.node_count();
    let mut scores = BTreeMap::new();

    for id in layer.node_ids() {
        let mut dist: BTreeMap<&NodeId, usize> = BTreeMap::from([(id, 0)]);
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let d = dist[current];
            for next in adjacency.get(current).into_iter().flatten() {
                if layer.contains_node(next) && !dist.contains_key(*next) {
                    dist.insert(*next, d + 1);
                    queue.push_back(*next);
                }
            }
        }
        let reached = dist.len() - 1;
        let total: usize = dist.values().sum();
        let score = if total > 0 && n > 1 {
            (reached as f64 / total as f64) * (reached as f64 / (n - 1) as f64)
        } else {
            0.0
        };
        scores.insert(id.clone(), score);
    }
    scores
}

/// Layer nodes in id order with their undirected neighbors by position
struct Positions<'a> {
    ids: Vec<&'a NodeId>,
    neighbors: Vec<Vec<usize>>,
}

impl<'a> Positions<'a> {
    fn of(layer: &'a Layer) -> Self {
        let ids = layer.node_ids();
        let position: HashMap<&NodeId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let adjacency = layer.undirected_adjacency();
        let neighbors = ids
            .iter()
            .map(|id| {
                let mut list: Vec<usize> = adjacency
                    .get(id)
                    .into_iter()
                    .flatten()
                    .filter_map(|n| position.get(n).copied())
                    .collect();
                list.sort_unstable();
                list
            })
            .collect();
        Self { ids, neighbors }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn scores(&self, values: Vec<f64>) -> BTreeMap<NodeId, f64> {
        self.ids.iter().map(|id| (*id).clone()).zip(values).collect()
    }
}

/// Shortest-path betweenness (Brandes), normalized by `(N - 1)(N - 2) / 2`
///
/// Layers with fewer than three nodes score 0 everywhere.
pub fn betweenness_centrality(layer: &Layer) -> BTreeMap<NodeId, f64> {
    let graph = Positions::of(layer);
    let n = graph.len();
    let mut scores = vec![0.0; n];

    for source in 0..n {
        let mut order = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut dist = vec![usize::MAX; n];
        sigma[source] = 1.0;
        dist[source] = 0;
        let mut queue = VecDeque::from([source]);

        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &w in &graph.neighbors[v] {
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        for &w in order.iter().rev() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                scores[w] += delta[w];
            }
        }
    }

    // every unordered pair was counted once from each end
    let scale = if n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        0.0
    };
    graph.scores(scores.into_iter().map(|s| s * scale).collect())
}

/// Eigenvector centrality by power iteration, unit Euclidean norm
///
/// Iterates `x + Ax` so bipartite layers do not oscillate. Falls back to 0
/// for every node when the iteration cap is reached first.
pub fn eigenvector_centrality(layer: &Layer) -> BTreeMap<NodeId, f64> {
    let graph = Positions::of(layer);
    let n = graph.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..EIGENVECTOR_MAX_ITERATIONS {
        let mut next = x.clone();
        for (v, list) in graph.neighbors.iter().enumerate() {
            for &w in list {
                next[w] += x[v];
            }
        }
        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            break;
        }
        for value in &mut next {
            *value /= norm;
        }
        let change: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if change < n as f64 * EIGENVECTOR_TOLERANCE {
            return graph.scores(x);
        }
    }

    warn!(layer = %layer.name(), "eigenvector centrality did not converge");
    graph.scores(vec![0.0; n])
}

/// PageRank inside one layer, edges followed both ways
///
/// Damping, tolerance and iteration cap come from `config`; nodes without
/// neighbors spread their score evenly. Scores sum to 1.
pub fn layer_pagerank(layer: &Layer, config: &PageRankConfig) -> BTreeMap<NodeId, f64> {
    let graph = Positions::of(layer);
    let n = graph.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];
    let mut converged = false;
    for _ in 0..config.max_iterations {
        let mut next = vec![(1.0 - config.damping) * uniform; n];
        let mut dangling = 0.0;
        for (v, list) in graph.neighbors.iter().enumerate() {
            if list.is_empty() {
                dangling += rank[v];
                continue;
            }
            let share = config.damping * rank[v] / list.len() as f64;
            for &w in list {
                next[w] += share;
            }
        }
        let spread = config.damping * dangling * uniform;
        for value in &mut next {
            *value += spread;
        }

        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < config.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(layer = %layer.name(), "layer pagerank hit the iteration cap");
    }
    graph.scores(rank)
}

/// Degree, betweenness, closeness, eigenvector and PageRank for one layer
pub fn layer_centralities(layer: &Layer, pagerank: &PageRankConfig) -> LayerCentralities {
    let result = LayerCentralities {
        layer: layer.name(),
        degree: degree_centrality(layer),
        betweenness: betweenness_centrality(layer),
        closeness: closeness_centrality(layer),
        eigenvector: eigenvector_centrality(layer),
        pagerank: layer_pagerank(layer, pagerank),
    };
    debug!(layer = %layer.name(), nodes = layer.node_count(), "layer centralities computed");
    result
}

/// Degree centrality of `id` in every layer holding it
fn held_centralities(network: &MultiplexNetwork, id: &NodeId) -> Vec<f64> {
    network
        .layers()
        .filter(|layer| layer.contains_node(id))
        .map(|layer| normalized_degree(layer, id))
        .collect()
}

/// Combine one node's per-layer degree centralities
pub fn node_multiplex_centrality(
    network: &MultiplexNetwork,
    id: &NodeId,
    method: CentralityMethod,
) -> f64 {
    let values = held_centralities(network, id);
    match method {
        CentralityMethod::Aggregate => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
        CentralityMethod::Max => values.into_iter().fold(0.0, f64::max),
        CentralityMethod::Harmonic => {
            let positive: Vec<f64> = values.into_iter().filter(|v| *v > 0.0).collect();
            if positive.is_empty() {
                0.0
            } else {
                positive.len() as f64 / positive.iter().map(|v| 1.0 / v).sum::<f64>()
            }
        }
    }
}

/// Multiplex centrality of every node in the network
pub fn multiplex_centrality(
    network: &MultiplexNetwork,
    method: CentralityMethod,
) -> BTreeMap<NodeId, f64> {
    let scores: BTreeMap<NodeId, f64> = network
        .node_ids()
        .into_iter()
        .map(|id| (id.clone(), node_multiplex_centrality(network, id, method)))
        .collect();
    debug!(nodes = scores.len(), ?method, "multiplex centrality computed");
    scores
}

/// How evenly a node's edges spread over all layers
///
/// `P = L / (L - 1) * (1 - Σ (k_l / k)²)`, clamped to [0, 1]; 0 for a node
/// without edges.
pub fn participation_coefficient(network: &MultiplexNetwork, id: &NodeId) -> f64 {
    let degrees: Vec<usize> = network
        .layers()
        .map(|layer| if layer.contains_node(id) { layer.degree(id) } else { 0 })
        .collect();
    let total: usize = degrees.iter().sum();
    let layers = degrees.len();
    if total == 0 || layers < 2 {
        return 0.0;
    }
    let spread: f64 = degrees
        .iter()
        .map(|k| (*k as f64 / total as f64).powi(2))
        .sum();
    let p = layers as f64 / (layers - 1) as f64 * (1.0 - spread);
    p.clamp(0.0, 1.0)
}

pub fn node_report(network: &MultiplexNetwork, id: &NodeId) -> NodeCentralityReport {
    NodeCentralityReport {
        node_id: id.clone(),
        layer_centralities: network
            .layers()
            .map(|layer| (layer.name(), normalized_degree(layer, id)))
            .collect(),
        aggregate_centrality: node_multiplex_centrality(network, id, CentralityMethod::Aggregate),
        versatility: network.calculate_versatility(id),
        participation_coefficient: participation_coefficient(network, id),
    }
}

/// Nodes present in at least `min_layers` layers, sorted
pub fn versatile_nodes(network: &MultiplexNetwork, min_layers: usize) -> Vec<NodeId> {
    network
        .membership()
        .into_iter()
        .filter(|(_, layers)| layers.len() >= min_layers)
        .map(|(id, _)| id)
        .collect()
}

/// Correlation of degree centrality between every pair of layers
///
/// Vectors range over the union node set, with 0 where a node is absent.
/// With fewer than two nodes the result is the identity; a constant vector
/// correlates 0 with every other layer.
pub fn layer_correlation(network: &MultiplexNetwork) -> LayerCorrelation {
    let nodes: Vec<&NodeId> = network.node_ids().into_iter().collect();
    let layers: Vec<LayerName> = network.layers().map(Layer::name).collect();
    let vectors: Vec<Vec<f64>> = network
        .layers()
        .map(|layer| nodes.iter().map(|id| normalized_degree(layer, id)).collect())
        .collect();

    let size = layers.len();
    let mut matrix = vec![vec![0.0; size]; size];
    for i in 0..size {
        matrix[i][i] = 1.0;
        if nodes.len() < 2 {
            continue;
        }
        for j in (i + 1)..size {
            let r = pearson(&vectors[i], &vectors[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    LayerCorrelation { layers, matrix }
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x).powi(2);
        var_y += (b - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, EdgeType, Node, NodeAttributes, NodeType};

    fn member(id: &str) -> Node {
        Node::new(id, id, NodeAttributes::empty(NodeType::Member))
    }

    /// a-b-c allied in coalition; a informs b in information flow
    fn sample() -> MultiplexNetwork {
        let mut network = MultiplexNetwork::new();
        for id in ["a", "b", "c"] {
            network.add_node_to_layers(member(id)).unwrap();
        }
        network
            .add_edge(create_edge(EdgeType::AlliesWith, &member("a"), &member("b")))
            .unwrap();
        network
            .add_edge(create_edge(EdgeType::AlliesWith, &member("b"), &member("c")))
            .unwrap();
        network
            .add_edge(create_edge(EdgeType::Informs, &member("a"), &member("b")))
            .unwrap();
        network
    }

    #[test]
    fn test_degree_and_closeness_on_a_path() {
        let network = sample();
        let layer = network.layer(LayerName::Coalition);
        let degree = degree_centrality(layer);
        assert!((degree[&NodeId::from("b")] - 1.0).abs() < 1e-12);
        assert!((degree[&NodeId::from("a")] - 0.5).abs() < 1e-12);

        let closeness = closeness_centrality(layer);
        assert!((closeness[&NodeId::from("b")] - 1.0).abs() < 1e-12);
        // a reaches b at 1 and c at 2
        assert!((closeness[&NodeId::from("a")] - 2.0 / 3.0).abs() < 1e-12);
    }

    fn allied(pairs: &[(&str, &str)]) -> Layer {
        let mut layer = Layer::new(LayerName::Coalition);
        for (a, b) in pairs {
            layer.add_node(member(a)).unwrap();
            layer.add_node(member(b)).unwrap();
        }
        for (a, b) in pairs {
            layer
                .add_edge(create_edge(EdgeType::AlliesWith, &member(a), &member(b)))
                .unwrap();
        }
        layer
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-4
    }

    #[test]
    fn test_star_layer_centralities() {
        let layer = allied(&[("hub", "a"), ("hub", "b"), ("hub", "c")]);
        let all = layer_centralities(&layer, &PageRankConfig::default());
        let hub = NodeId::from("hub");
        let leaf = NodeId::from("a");

        assert_eq!(all.layer, LayerName::Coalition);
        assert!(close(all.degree[&hub], 1.0));
        assert!(close(all.betweenness[&hub], 1.0));
        assert_eq!(all.betweenness[&leaf], 0.0);
        assert!(close(all.eigenvector[&hub], 1.0 / 2f64.sqrt()));
        assert!(close(all.eigenvector[&leaf], 1.0 / 6f64.sqrt()));

        // hub = 0.0375 + 0.85 * 3 * leaf, leaf = 0.0375 + 0.85 * hub / 3
        assert!(close(all.pagerank[&hub], 0.133125 / 0.2775));
        let total: f64 = all.pagerank.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(close(all.pagerank[&leaf], all.pagerank[&NodeId::from("c")]));
    }

    #[test]
    fn test_path_layer_centralities() {
        let layer = allied(&[("a", "b"), ("b", "c"), ("c", "d")]);
        let a = NodeId::from("a");
        let b = NodeId::from("b");

        let betweenness = betweenness_centrality(&layer);
        assert!(close(betweenness[&b], 2.0 / 3.0));
        assert!(close(betweenness[&NodeId::from("c")], 2.0 / 3.0));
        assert_eq!(betweenness[&a], 0.0);

        // components follow sin(k * pi / 5)
        let eigenvector = eigenvector_centrality(&layer);
        assert!(close(eigenvector[&a], 0.371748));
        assert!(close(eigenvector[&b], 0.601501));

        let pagerank = layer_pagerank(&layer, &PageRankConfig::default());
        assert!(close(pagerank[&a], pagerank[&NodeId::from("d")]));
        assert!(pagerank[&b] > pagerank[&a]);
    }

    #[test]
    fn test_small_and_edgeless_layers() {
        let empty = Layer::new(LayerName::Coalition);
        assert!(eigenvector_centrality(&empty).is_empty());
        assert!(layer_pagerank(&empty, &PageRankConfig::default()).is_empty());

        let pair = allied(&[("a", "b")]);
        assert!(betweenness_centrality(&pair).values().all(|v| *v == 0.0));

        let mut loners = Layer::new(LayerName::Coalition);
        for id in ["x", "y", "z", "w"] {
            loners.add_node(member(id)).unwrap();
        }
        let pagerank = layer_pagerank(&loners, &PageRankConfig::default());
        assert!(pagerank.values().all(|v| close(*v, 0.25)));
    }

    #[test]
    fn test_methods_combine_layers_differently() {
        let network = sample();
        let a = NodeId::from("a");
        // coalition 0.5, information flow 0.5, jurisdiction 0
        let aggregate = node_multiplex_centrality(&network, &a, CentralityMethod::Aggregate);
        assert!((aggregate - 1.0 / 3.0).abs() < 1e-12);
        assert!((node_multiplex_centrality(&network, &a, CentralityMethod::Max) - 0.5).abs() < 1e-12);
        assert!(
            (node_multiplex_centrality(&network, &a, CentralityMethod::Harmonic) - 0.5).abs() < 1e-12
        );
        assert_eq!(
            node_multiplex_centrality(&network, &NodeId::from("ghost"), CentralityMethod::Harmonic),
            0.0
        );
    }

    #[test]
    fn test_participation_coefficient_spreads() {
        let network = sample();
        // a: one edge in coalition, one in information flow, across 7 layers
        let p = participation_coefficient(&network, &NodeId::from("a"));
        let expected = 7.0 / 6.0 * (1.0 - 0.5);
        assert!((p - expected).abs() < 1e-12);
        // c: all edges in one layer
        assert_eq!(participation_coefficient(&network, &NodeId::from("c")), 0.0);
    }

    #[test]
    fn test_report_and_versatile_nodes() {
        let network = sample();
        let report = node_report(&network, &NodeId::from("b"));
        assert_eq!(report.layer_centralities.len(), 7);
        assert!((report.versatility - 3.0 / 7.0).abs() < 1e-12);
        assert_eq!(versatile_nodes(&network, 3).len(), 3);
        assert!(versatile_nodes(&network, 4).is_empty());
    }

    #[test]
    fn test_layer_correlation_is_symmetric_with_unit_diagonal() {
        let network = sample();
        let corr = layer_correlation(&network);
        assert_eq!(corr.layers.len(), 7);
        for i in 0..7 {
            assert_eq!(corr.matrix[i][i], 1.0);
            for j in 0..7 {
                assert_eq!(corr.matrix[i][j], corr.matrix[j][i]);
            }
        }
        // empty capability layer is constant
        assert_eq!(corr.get(LayerName::Capability, LayerName::Coalition), Some(0.0));
    }

    #[test]
    fn test_layer_correlation_identity_for_tiny_networks() {
        let corr = layer_correlation(&MultiplexNetwork::new());
        assert_eq!(corr.get(LayerName::Coalition, LayerName::Procedural), Some(0.0));
        assert_eq!(corr.get(LayerName::Coalition, LayerName::Coalition), Some(1.0));
    }
}
