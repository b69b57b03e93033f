//! Institutional-dynamics metrics over the aggregate network
//!
//! Everything here works on the [`AggregateGraph`] projection of all seven
//! layers, except information asymmetry (InformationFlow only) and
//! meta-stability (per-layer balance).

use super::aggregate::AggregateGraph;
use super::balance::analyze_triangles;
use crate::config::{AccessMeasure, DominancePolicyKind};
use crate::graph::{LayerName, MultiplexNetwork, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Junctions examined when counting alternative histories
const HISTORY_JUNCTIONS: usize = 10;
const HISTORY_HOPS: usize = 3;
const CASCADE_TRIGGERS: usize = 5;
const CASCADE_WAVES: usize = 10;
pub const DEFAULT_MAX_CYCLES: usize = 1000;

/// Linear-interpolation percentile, `p` in [0, 100]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Gini coefficient of a non-negative distribution; 0 when it sums to 0
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    let total: f64 = values.iter().sum();
    if n == 0 || total <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, s)| (2.0 * i as f64 - n as f64 + 1.0) * s)
        .sum();
    (weighted / (n as f64 * total)).clamp(0.0, 1.0)
}

/// Scores how strongly a constraint node shapes the rest of the graph
///
/// Implementations must be monotone: growing a constraint's reach never
/// lowers its score.
pub trait DominancePolicy {
    fn score(&self, graph: &AggregateGraph, constraint: &NodeId) -> f64;
}

/// Share of the other nodes reachable downstream within `max_hops`
#[derive(Debug, Clone, Copy)]
pub struct ReachMass {
    pub max_hops: usize,
}

impl DominancePolicy for ReachMass {
    fn score(&self, graph: &AggregateGraph, constraint: &NodeId) -> f64 {
        let n = graph.node_count();
        if n <= 1 {
            return 0.0;
        }
        let reached = graph.distances(constraint, self.max_hops).len().saturating_sub(1);
        reached as f64 / (n - 1) as f64
    }
}

/// Share of (upstream, downstream) node pairs routed through the constraint
#[derive(Debug, Clone, Copy)]
pub struct PathCoverage {
    pub max_hops: usize,
}

impl DominancePolicy for PathCoverage {
    fn score(&self, graph: &AggregateGraph, constraint: &NodeId) -> f64 {
        let n = graph.node_count();
        if n <= 1 {
            return 0.0;
        }
        let down = graph.distances(constraint, self.max_hops).len().saturating_sub(1);
        let up = graph
            .upstream_distances(constraint, self.max_hops)
            .len()
            .saturating_sub(1);
        let others = (n - 1) as f64;
        // a source constraint still counts its own downstream
        ((up + 1) * down) as f64 / (n as f64 * others)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDominance {
    pub scores: BTreeMap<NodeId, f64>,
    /// `(stronger, weaker)` for adjacent constraints in descending score
    pub hierarchy: Vec<(NodeId, NodeId)>,
    pub dominant: Vec<NodeId>,
    /// Near 1 when the top constraint barely leads the median
    pub switch_likelihood: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    pub trigger: NodeId,
    /// Nodes newly activated in each wave after the trigger
    pub waves: Vec<Vec<NodeId>>,
    pub activated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentSubgraph {
    pub nodes: Vec<NodeId>,
    pub triggers: Vec<NodeId>,
    pub activation_threshold: f64,
    pub cascades: Vec<Cascade>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentAnalysis {
    pub main_component: Vec<NodeId>,
    pub subgraphs: Vec<LatentSubgraph>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDependence {
    /// Nodes with two or more outgoing arcs
    pub junctions: Vec<NodeId>,
    /// Nodes reachable through exactly one junction, mapped to it
    pub single_junction_dependents: BTreeMap<NodeId, NodeId>,
    pub alternative_histories: usize,
    pub lock_in_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndogenousRisk {
    pub scores: BTreeMap<NodeId, f64>,
    pub cycle_participation: BTreeMap<NodeId, usize>,
    pub cycles_found: usize,
    /// True when enumeration stopped at the cycle cap
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaStability {
    /// 0 is fully balanced, 1 fully frustrated
    pub score: f64,
    pub interpretation: String,
    /// Balance ratio of every layer that has triangles
    pub layer_balance: BTreeMap<LayerName, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryPair {
    pub advantaged: NodeId,
    pub disadvantaged: NodeId,
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationAsymmetry {
    /// Normalized access per InformationFlow node
    pub access: BTreeMap<NodeId, f64>,
    pub gini: f64,
    pub hubs: Vec<NodeId>,
    pub periphery: Vec<NodeId>,
    pub pairs: Vec<AsymmetryPair>,
}

/// Metric suite bound to one network
pub struct InstitutionalMetrics<'a> {
    network: &'a MultiplexNetwork,
    graph: AggregateGraph,
}

impl<'a> InstitutionalMetrics<'a> {
    pub fn new(network: &'a MultiplexNetwork) -> Self {
        Self {
            network,
            graph: AggregateGraph::from_network(network),
        }
    }

    pub fn graph(&self) -> &AggregateGraph {
        &self.graph
    }

    /// Dominance with the policy named in the network's config
    pub fn constraint_dominance(&self, constraints: &[NodeId]) -> ConstraintDominance {
        let config = &self.network.config().dominance;
        match config.policy {
            DominancePolicyKind::ReachMass => self.constraint_dominance_with(
                constraints,
                &ReachMass {
                    max_hops: config.max_hops,
                },
            ),
            DominancePolicyKind::PathCoverage => self.constraint_dominance_with(
                constraints,
                &PathCoverage {
                    max_hops: config.max_hops,
                },
            ),
        }
    }

    pub fn constraint_dominance_with(
        &self,
        constraints: &[NodeId],
        policy: &dyn DominancePolicy,
    ) -> ConstraintDominance {
        let scores: BTreeMap<NodeId, f64> = constraints
            .iter()
            .map(|c| (c.clone(), policy.score(&self.graph, c)))
            .collect();

        let mut ranked: Vec<(&NodeId, f64)> = scores.iter().map(|(id, s)| (id, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let hierarchy = ranked
            .windows(2)
            .filter(|w| w[0].1 > w[1].1)
            .map(|w| (w[0].0.clone(), w[1].0.clone()))
            .collect();

        let values: Vec<f64> = scores.values().copied().collect();
        let cut = percentile(&values, self.network.config().dominance.dominant_percentile);
        let dominant = ranked
            .iter()
            .filter(|(_, s)| *s >= cut)
            .map(|(id, _)| (*id).clone())
            .collect();

        let max = values.iter().copied().fold(0.0, f64::max);
        let switch_likelihood = if values.len() < 2 || max <= 0.0 {
            0.0
        } else {
            let median = percentile(&values, 50.0);
            (1.0 - (max - median) / max).clamp(0.0, 1.0)
        };

        debug!(constraints = constraints.len(), switch_likelihood, "constraint dominance computed");
        ConstraintDominance {
            scores,
            hierarchy,
            dominant,
            switch_likelihood,
        }
    }

    /// Components cut off from the main body of the network
    ///
    /// Components are formed from arcs of weight at least
    /// `connection_threshold`; any arc counts when finding triggers.
    pub fn latent_subgraphs(&self, connection_threshold: f64) -> LatentAnalysis {
        let mut components = self.graph.weak_components(|w| w >= connection_threshold);
        if components.is_empty() {
            return LatentAnalysis {
                main_component: Vec::new(),
                subgraphs: Vec::new(),
            };
        }
        let main_component = components.remove(0);
        let main: BTreeSet<&NodeId> = main_component.iter().collect();

        let subgraphs = components
            .into_iter()
            .filter(|c| c.len() > 2)
            .map(|nodes| {
                let members: BTreeSet<&NodeId> = nodes.iter().collect();
                let mut triggers = Vec::new();
                let mut inbound = Vec::new();
                for id in &nodes {
                    let mut touches_main = false;
                    for (pred, w) in self.graph.predecessors(id) {
                        if main.contains(pred) {
                            touches_main = true;
                            inbound.push(w);
                        }
                    }
                    if self.graph.successors(id).any(|(s, _)| main.contains(s)) {
                        touches_main = true;
                    }
                    if touches_main {
                        triggers.push(id.clone());
                    }
                }
                let activation_threshold = if inbound.is_empty() {
                    1.0
                } else {
                    let mean = inbound.iter().sum::<f64>() / inbound.len() as f64;
                    (1.0 - mean).clamp(0.0, 1.0)
                };
                let cascades = triggers
                    .iter()
                    .take(CASCADE_TRIGGERS)
                    .map(|t| self.cascade(t, &members, activation_threshold))
                    .collect();
                LatentSubgraph {
                    nodes,
                    triggers,
                    activation_threshold,
                    cascades,
                }
            })
            .collect::<Vec<_>>();

        debug!(latent = subgraphs.len(), "latent subgraphs detected");
        LatentAnalysis {
            main_component,
            subgraphs,
        }
    }

    /// Threshold activation confined to one subgraph
    ///
    /// A node activates once the active share of its in-subgraph
    /// predecessors reaches `threshold`.
    fn cascade(&self, trigger: &NodeId, members: &BTreeSet<&NodeId>, threshold: f64) -> Cascade {
        let mut active: BTreeSet<&NodeId> = BTreeSet::from([trigger]);
        let mut waves = Vec::new();
        for _ in 0..CASCADE_WAVES {
            let wave: Vec<NodeId> = members
                .iter()
                .filter(|id| !active.contains(*id))
                .filter(|id| {
                    let preds: Vec<&NodeId> = self
                        .graph
                        .predecessors(id)
                        .map(|(p, _)| p)
                        .filter(|p| members.contains(p))
                        .collect();
                    if preds.is_empty() {
                        return false;
                    }
                    let on = preds.iter().filter(|p| active.contains(*p)).count();
                    on as f64 / preds.len() as f64 >= threshold
                })
                .map(|id| (*id).clone())
                .collect();
            if wave.is_empty() {
                break;
            }
            for id in &wave {
                if let Some(member) = members.get(id) {
                    active.insert(*member);
                }
            }
            waves.push(wave);
        }
        Cascade {
            trigger: trigger.clone(),
            activated: active.len(),
            waves,
        }
    }

    pub fn path_dependence(&self) -> PathDependence {
        let junctions: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|id| self.graph.out_degree(id) >= 2)
            .cloned()
            .collect();

        let mut reached_by: BTreeMap<NodeId, Vec<&NodeId>> = BTreeMap::new();
        for junction in &junctions {
            for id in self.graph.descendants(junction) {
                reached_by.entry(id).or_default().push(junction);
            }
        }
        let single_junction_dependents: BTreeMap<NodeId, NodeId> = reached_by
            .into_iter()
            .filter(|(_, js)| js.len() == 1)
            .map(|(id, js)| (id, js[0].clone()))
            .collect();

        let alternative_histories = junctions
            .iter()
            .take(HISTORY_JUNCTIONS)
            .map(|j| self.graph.distances(j, HISTORY_HOPS).len().saturating_sub(1))
            .sum();

        let n = self.graph.node_count();
        let lock_in_score = if n == 0 {
            0.0
        } else {
            single_junction_dependents.len() as f64 / n as f64
        };
        PathDependence {
            junctions,
            single_junction_dependents,
            alternative_histories,
            lock_in_score,
        }
    }

    /// Weighted count of options within three hops, nearer options weighing more
    pub fn structural_optionality(&self) -> BTreeMap<NodeId, f64> {
        let n = self.graph.node_count();
        self.graph
            .nodes()
            .map(|id| {
                if n <= 1 {
                    return (id.clone(), 0.0);
                }
                let mut rings = [0usize; 3];
                for d in self.graph.distances(id, 3).into_values() {
                    if (1..=3).contains(&d) {
                        rings[d - 1] += 1;
                    }
                }
                let weighted = 3 * rings[0] + 2 * rings[1] + rings[2];
                (id.clone(), weighted as f64 / (6 * (n - 1)) as f64)
            })
            .collect()
    }

    /// Risk from feedback loops, using simple directed cycles up to `max_cycles`
    pub fn endogenous_risk(&self, max_cycles: usize) -> EndogenousRisk {
        let order: Vec<&NodeId> = self.graph.nodes().collect();
        let mut participation: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut found = 0usize;

        'starts: for (i, start) in order.iter().enumerate() {
            // cycles are rooted at their smallest node, so later starts skip earlier nodes
            let allowed: BTreeSet<&NodeId> = order[i..].iter().copied().collect();
            let mut path: Vec<&NodeId> = vec![*start];
            let mut on_path: BTreeSet<&NodeId> = BTreeSet::from([*start]);
            let mut stack: Vec<Vec<&NodeId>> = vec![self.next_hops(start, &allowed)];

            while let Some(frontier) = stack.last_mut() {
                let Some(next) = frontier.pop() else {
                    stack.pop();
                    if let Some(left) = path.pop() {
                        on_path.remove(left);
                    }
                    continue;
                };
                if next == *start {
                    found += 1;
                    for id in &path {
                        *participation.entry((*id).clone()).or_insert(0) += 1;
                    }
                    if found >= max_cycles {
                        break 'starts;
                    }
                } else if on_path.insert(next) {
                    path.push(next);
                    stack.push(self.next_hops(next, &allowed));
                }
            }
        }
        let truncated = found >= max_cycles;
        if truncated {
            warn!(max_cycles, "cycle enumeration stopped at cap");
        }

        let max_part = participation.values().copied().max().unwrap_or(0);
        let max_in = self
            .graph
            .nodes()
            .map(|id| self.graph.in_degree(id))
            .max()
            .unwrap_or(0);
        let scores = self
            .graph
            .nodes()
            .map(|id| {
                let part = participation.get(id).copied().unwrap_or(0);
                let part_term = if max_part > 0 { part as f64 / max_part as f64 } else { 0.0 };
                let in_term = if max_in > 0 {
                    self.graph.in_degree(id) as f64 / max_in as f64
                } else {
                    0.0
                };
                (id.clone(), 0.7 * part_term + 0.3 * in_term)
            })
            .collect();

        EndogenousRisk {
            scores,
            cycle_participation: participation,
            cycles_found: found,
            truncated,
        }
    }

    fn next_hops<'g>(&'g self, id: &NodeId, allowed: &BTreeSet<&'g NodeId>) -> Vec<&'g NodeId> {
        self.graph
            .successors(id)
            .filter_map(|(n, _)| allowed.get(n).copied())
            .collect()
    }

    /// Weighted imbalance across layers that have triangles
    pub fn meta_stability(&self) -> MetaStability {
        let config = &self.network.config().meta_stability;
        let mut layer_balance = BTreeMap::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for layer in self.network.layers() {
            let triangles = analyze_triangles(layer);
            if triangles.total_triangles == 0 {
                continue;
            }
            let weight = config.weight(layer.name());
            weighted += weight * (1.0 - triangles.balance_ratio);
            total_weight += weight;
            layer_balance.insert(layer.name(), triangles.balance_ratio);
        }
        let score = if total_weight > 0.0 {
            (weighted / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let interpretation = if score > config.high_band {
            "highly meta-stable (likely to transition)"
        } else if score > config.moderate_band {
            "moderately meta-stable"
        } else {
            "stable"
        };
        MetaStability {
            score,
            interpretation: interpretation.to_string(),
            layer_balance,
        }
    }

    pub fn information_asymmetry(&self) -> InformationAsymmetry {
        let config = &self.network.config().asymmetry;
        let view = self.network.information_flow();
        let layer = self.network.layer(LayerName::InformationFlow);
        let n = layer.node_count();
        let denom = n.saturating_sub(1).max(1) as f64;

        let access: BTreeMap<NodeId, f64> = layer
            .node_ids()
            .into_iter()
            .map(|id| {
                let raw = match config.measure {
                    AccessMeasure::Reach => view.reach(id, config.max_hops).len(),
                    AccessMeasure::Degree => layer.degree(id),
                };
                (id.clone(), raw as f64 / denom)
            })
            .collect();

        let values: Vec<f64> = access.values().copied().collect();
        let hub_cut = percentile(&values, config.hub_percentile);
        let periphery_cut = percentile(&values, config.periphery_percentile);
        let hubs = access
            .iter()
            .filter(|(_, a)| **a >= hub_cut)
            .map(|(id, _)| id.clone())
            .collect();
        let periphery = access
            .iter()
            .filter(|(_, a)| **a <= periphery_cut)
            .map(|(id, _)| id.clone())
            .collect();

        let entries: Vec<(&NodeId, f64)> = access.iter().map(|(id, a)| (id, *a)).collect();
        let mut pairs = Vec::new();
        for (i, (a, sa)) in entries.iter().enumerate() {
            for (b, sb) in &entries[i + 1..] {
                let gap = (sa - sb).abs();
                if gap > config.pair_threshold {
                    let (advantaged, disadvantaged) = if sa >= sb { (a, b) } else { (b, a) };
                    pairs.push(AsymmetryPair {
                        advantaged: (*advantaged).clone(),
                        disadvantaged: (*disadvantaged).clone(),
                        gap,
                    });
                }
            }
        }
        pairs.sort_by(|x, y| {
            y.gap
                .total_cmp(&x.gap)
                .then_with(|| x.advantaged.cmp(&y.advantaged))
                .then_with(|| x.disadvantaged.cmp(&y.disadvantaged))
        });
        pairs.truncate(config.max_pairs);

        let gini = gini(&values);
        debug!(nodes = n, gini, pairs = pairs.len(), "information asymmetry computed");
        InformationAsymmetry {
            access,
            gini,
            hubs,
            periphery,
            pairs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, EdgeType, Node, NodeAttributes, NodeType};

    fn staff(id: &str) -> Node {
        Node::new(id, id, NodeAttributes::empty(NodeType::Staff))
    }

    fn informs(network: &mut MultiplexNetwork, from: &str, to: &str) {
        network
            .add_edge(create_edge(EdgeType::Informs, &staff(from), &staff(to)))
            .unwrap();
    }

    fn staff_network(ids: &[&str], arcs: &[(&str, &str)]) -> MultiplexNetwork {
        let mut network = MultiplexNetwork::new();
        for id in ids {
            network.add_node_to_layers(staff(id)).unwrap();
        }
        for (from, to) in arcs {
            informs(&mut network, from, to);
        }
        network
    }

    #[test]
    fn percentile_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), 2.5);
        assert_eq!(percentile(&[5.0], 90.0), 5.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn gini_of_equal_values_is_zero() {
        assert_eq!(gini(&[1.0, 1.0, 1.0]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
        assert!((gini(&[0.0, 0.0, 0.0, 1.0]) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn dominance_grows_with_reach() {
        let mut network = staff_network(&["c", "d", "x", "y", "z"], &[("c", "x"), ("d", "y")]);
        let ids = [NodeId::from("c"), NodeId::from("d")];
        let before = InstitutionalMetrics::new(&network).constraint_dominance(&ids);
        assert_eq!(before.scores[&ids[0]], before.scores[&ids[1]]);
        assert!(before.hierarchy.is_empty());

        informs(&mut network, "x", "z");
        let after = InstitutionalMetrics::new(&network).constraint_dominance(&ids);
        assert!(after.scores[&ids[0]] > before.scores[&ids[0]]);
        assert_eq!(after.hierarchy, vec![(ids[0].clone(), ids[1].clone())]);
        assert_eq!(after.dominant, vec![ids[0].clone()]);
    }

    #[test]
    fn single_constraint_has_no_switch_likelihood() {
        let network = staff_network(&["c", "x"], &[("c", "x")]);
        let result = InstitutionalMetrics::new(&network).constraint_dominance(&[NodeId::from("c")]);
        assert_eq!(result.switch_likelihood, 0.0);
    }

    #[test]
    fn path_coverage_counts_through_traffic() {
        let network = staff_network(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let metrics = InstitutionalMetrics::new(&network);
        let policy = PathCoverage { max_hops: 5 };
        let middle = policy.score(metrics.graph(), &NodeId::from("b"));
        let sink = policy.score(metrics.graph(), &NodeId::from("c"));
        assert!(middle > sink);
        assert_eq!(sink, 0.0);
    }

    #[test]
    fn latent_component_is_found_with_triggers() {
        let network = staff_network(
            &["m1", "m2", "m3", "m4", "l1", "l2", "l3"],
            &[("m1", "m2"), ("m2", "m3"), ("m3", "m4"), ("l1", "l2"), ("l2", "l3")],
        );
        let mut network = network;
        network
            .add_edge(create_edge(EdgeType::Informs, &staff("m4"), &staff("l1")).with_weight(0.2))
            .unwrap();

        let analysis = InstitutionalMetrics::new(&network).latent_subgraphs(0.5);
        assert_eq!(analysis.main_component.len(), 4);
        assert_eq!(analysis.subgraphs.len(), 1);
        let latent = &analysis.subgraphs[0];
        assert_eq!(latent.triggers, vec![NodeId::from("l1")]);
        assert!((latent.activation_threshold - 0.8).abs() < 1e-9);
        let cascade = &latent.cascades[0];
        assert_eq!(cascade.activated, 3);
        assert_eq!(cascade.waves.len(), 2);
    }

    #[test]
    fn path_dependence_finds_junctions() {
        let network = staff_network(&["j", "a", "b", "c"], &[("j", "a"), ("j", "b"), ("a", "c")]);
        let result = InstitutionalMetrics::new(&network).path_dependence();
        assert_eq!(result.junctions, vec![NodeId::from("j")]);
        assert_eq!(result.single_junction_dependents.len(), 3);
        assert_eq!(result.alternative_histories, 3);
        assert!((result.lock_in_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn optionality_weights_nearer_rings() {
        let network = staff_network(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let result = InstitutionalMetrics::new(&network).structural_optionality();
        assert!((result[&NodeId::from("a")] - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(result[&NodeId::from("d")], 0.0);
    }

    #[test]
    fn cycles_drive_endogenous_risk() {
        let network = staff_network(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("d", "a")],
        );
        let result = InstitutionalMetrics::new(&network).endogenous_risk(DEFAULT_MAX_CYCLES);
        assert_eq!(result.cycles_found, 1);
        assert!(!result.truncated);
        assert_eq!(result.cycle_participation.get(&NodeId::from("d")), None);
        assert!(result.scores[&NodeId::from("a")] > result.scores[&NodeId::from("d")]);
        assert!((result.scores[&NodeId::from("a")] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cycle_cap_truncates() {
        let network = staff_network(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")]);
        let result = InstitutionalMetrics::new(&network).endogenous_risk(1);
        assert_eq!(result.cycles_found, 1);
        assert!(result.truncated);
    }

    #[test]
    fn meta_stability_without_triangles_is_stable() {
        let network = staff_network(&["a", "b"], &[("a", "b")]);
        let result = InstitutionalMetrics::new(&network).meta_stability();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.interpretation, "stable");
        assert!(result.layer_balance.is_empty());
    }

    #[test]
    fn asymmetry_separates_hub_from_periphery() {
        let network = staff_network(
            &["hub", "a", "b", "c", "lone"],
            &[("hub", "a"), ("hub", "b"), ("hub", "c")],
        );
        let result = InstitutionalMetrics::new(&network).information_asymmetry();
        assert_eq!(result.hubs, vec![NodeId::from("hub")]);
        assert!(result.periphery.contains(&NodeId::from("lone")));
        assert!(result.gini > 0.0);
        assert_eq!(result.pairs[0].advantaged, NodeId::from("hub"));
    }
}
