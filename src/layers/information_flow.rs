//! Information-flow layer: who informs whom

use crate::cancel::{is_cancelled, CancellationToken};
use crate::graph::{Layer, LayerName, LayerPolicy, NodeId, NodeType, ValidationIssue};
use crate::query::index::EdgeIndex;
use crate::query::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, warn};

const NODE_TYPES: &[NodeType] = &[
    NodeType::Member,
    NodeType::Committee,
    NodeType::Subcommittee,
    NodeType::Staff,
    NodeType::Agency,
    NodeType::SubAgency,
    NodeType::OversightBody,
    NodeType::SalienceIndicator,
    NodeType::MemoryMarker,
];

pub struct InformationFlowPolicy;

impl LayerPolicy for InformationFlowPolicy {
    fn name(&self) -> LayerName {
        LayerName::InformationFlow
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        10
    }

    fn traversal(&self) -> Direction {
        Direction::Both
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = layer
            .edges()
            .filter(|e| e.is_self_loop())
            .map(|e| {
                ValidationIssue::new(
                    "information_self_loop",
                    &e.id,
                    format!("{} informs itself", e.source_id),
                )
            })
            .collect();
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        issues
    }
}

/// Betweenness over depth-bounded shortest paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Betweenness {
    /// Score per node; every layer node appears, possibly with 0
    pub scores: BTreeMap<NodeId, f64>,
    /// Ordered pairs with at least one path
    pub connected_pairs: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct InformationFlowView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> InformationFlowView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::InformationFlow).then_some(Self { layer })
    }

    /// Nodes reachable from `id` within `max_hops`, with their hop distance
    ///
    /// Directed edges are followed forward only.
    pub fn reach(&self, id: &NodeId, max_hops: usize) -> Vec<(NodeId, usize)> {
        let index = EdgeIndex::build(self.layer.edges());
        let mut dist: HashMap<&NodeId, usize> = HashMap::new();
        let mut queue: VecDeque<(&NodeId, usize)> = VecDeque::new();

        let Some(origin) = self.layer.get_node(id) else {
            return Vec::new();
        };
        dist.insert(&origin.id, 0);
        queue.push_back((&origin.id, 0));

        while let Some((current, d)) = queue.pop_front() {
            if d >= max_hops {
                continue;
            }
            for (_, next) in index.steps(current, Direction::Both) {
                if !dist.contains_key(next) {
                    dist.insert(next, d + 1);
                    queue.push_back((next, d + 1));
                }
            }
        }

        let mut reached: Vec<(NodeId, usize)> = dist
            .into_iter()
            .filter(|(n, _)| *n != id)
            .map(|(n, d)| (n.clone(), d))
            .collect();
        reached.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        reached
    }

    /// Betweenness over shortest paths of at most `max_depth` hops
    ///
    /// For every ordered pair within `max_depth` hops, each interior node
    /// gains the share of the pair's shortest paths running through it.
    /// Shortest paths are counted per source by BFS with path multiplicities
    /// (Brandes accumulation), so the result equals splitting `1 / k` over
    /// the `k` tied shortest paths without enumerating them. Parallel edges
    /// count as distinct paths. Pairs further apart than `max_depth` are
    /// ignored. On cancellation, sources not yet processed contribute nothing.
    pub fn approximate_betweenness(
        &self,
        max_depth: usize,
        cancel: Option<&CancellationToken>,
    ) -> Betweenness {
        let ids = self.layer.node_ids();
        let mut result = Betweenness {
            scores: ids.iter().map(|id| ((*id).clone(), 0.0)).collect(),
            ..Betweenness::default()
        };
        debug!(nodes = ids.len(), max_depth, "approximate betweenness");

        let index = EdgeIndex::build(self.layer.edges());
        let direction = self.layer.traversal();

        for source in &ids {
            if is_cancelled(cancel) {
                result.cancelled = true;
                break;
            }
            let (order, preds, sigma) = shortest_path_dag(&index, source, direction, max_depth);
            result.connected_pairs += order.len().saturating_sub(1);

            let mut delta: HashMap<&NodeId, f64> = HashMap::new();
            for w in order.iter().rev() {
                let dw = delta.get(w).copied().unwrap_or(0.0);
                for v in preds.get(w).into_iter().flatten() {
                    let share = sigma[v] / sigma[w] * (1.0 + dw);
                    *delta.entry(*v).or_insert(0.0) += share;
                }
                if w != source {
                    if let Some(score) = result.scores.get_mut(*w) {
                        *score += dw;
                    }
                }
            }
        }

        if result.cancelled {
            warn!(pairs = result.connected_pairs, "betweenness cancelled");
        }
        result
    }

    /// Connected components ignoring edge direction, largest first
    pub fn detect_silos(&self) -> Vec<Vec<NodeId>> {
        let adjacency = self.layer.undirected_adjacency();
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut silos = Vec::new();

        for start in self.layer.node_ids() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start.clone()];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for next in adjacency.get(current).into_iter().flatten() {
                    if self.layer.contains_node(next) && seen.insert(next) {
                        component.push((*next).clone());
                        queue.push_back(next);
                    }
                }
            }
            component.sort();
            silos.push(component);
        }
        silos.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        silos
    }
}

/// BFS from `source` up to `max_depth` hops
///
/// Returns nodes in visiting order (source first), the shortest-path
/// predecessors of each node (one entry per edge) and the number of
/// shortest paths reaching each node.
fn shortest_path_dag<'a>(
    index: &EdgeIndex<'a>,
    source: &'a NodeId,
    direction: Direction,
    max_depth: usize,
) -> (
    Vec<&'a NodeId>,
    HashMap<&'a NodeId, Vec<&'a NodeId>>,
    HashMap<&'a NodeId, f64>,
) {
    let mut order = vec![source];
    let mut dist: HashMap<&NodeId, usize> = HashMap::from([(source, 0)]);
    let mut sigma: HashMap<&NodeId, f64> = HashMap::from([(source, 1.0)]);
    let mut preds: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    let mut queue = VecDeque::from([source]);

    while let Some(current) = queue.pop_front() {
        let d = dist[current];
        if d >= max_depth {
            continue;
        }
        let paths_here = sigma[current];
        for (_, next) in index.steps(current, direction) {
            match dist.get(next) {
                None => {
                    dist.insert(next, d + 1);
                    order.push(next);
                    queue.push_back(next);
                }
                Some(&dn) if dn != d + 1 => continue,
                Some(_) => {}
            }
            *sigma.entry(next).or_insert(0.0) += paths_here;
            preds.entry(next).or_default().push(current);
        }
    }
    (order, preds, sigma)
}
