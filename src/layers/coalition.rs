//! Coalition layer: alliances and oppositions between actors

use crate::analysis::community::{label_propagation, Communities};
use crate::graph::{EdgeType, Layer, LayerName, LayerPolicy, NodeId, NodeType, Sign, ValidationIssue};
use crate::query::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::debug;

const NODE_TYPES: &[NodeType] = &[
    NodeType::Member,
    NodeType::Committee,
    NodeType::Subcommittee,
    NodeType::Agency,
    NodeType::IndustrySegment,
];

/// Strength multiplier applied for every hop past the first
const HOP_DECAY: f64 = 0.5;

pub struct CoalitionPolicy;

impl LayerPolicy for CoalitionPolicy {
    fn name(&self) -> LayerName {
        LayerName::Coalition
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        6
    }

    fn traversal(&self) -> Direction {
        Direction::Both
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for edge in layer.edges() {
            let expected = match edge.edge_type {
                EdgeType::AlliesWith | EdgeType::Compatible => Sign::Positive,
                EdgeType::Opposes | EdgeType::Incompatible => Sign::Negative,
                _ => continue,
            };
            if edge.sign != expected {
                issues.push(ValidationIssue::new(
                    "coalition_sign",
                    &edge.id,
                    format!("{} must be {}, found {}", edge.edge_type, expected, edge.sign),
                ));
            }
        }
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        issues
    }
}

/// An actor reachable through alliances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ally {
    pub id: NodeId,
    /// Best strength over all alliance paths found
    pub strength: f64,
    /// Hops on the path that produced `strength`
    pub distance: usize,
}

/// Groups of actors found by label propagation over alliances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoalitionBlocks {
    pub blocks: Vec<Vec<NodeId>>,
    pub converged: bool,
    pub iterations: usize,
}

impl From<Communities> for CoalitionBlocks {
    fn from(c: Communities) -> Self {
        Self {
            blocks: c.groups,
            converged: c.converged,
            iterations: c.iterations,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoalitionView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> CoalitionView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::Coalition).then_some(Self { layer })
    }

    /// Alliance neighbors of `id` with the strongest direct weight to each
    ///
    /// Alliances are symmetric, so edge orientation is ignored.
    pub fn alliance_weights(&self, id: &NodeId) -> BTreeMap<NodeId, f64> {
        let mut weights: BTreeMap<NodeId, f64> = BTreeMap::new();
        for edge in self.layer.adjacent_edges(id) {
            if edge.edge_type != EdgeType::AlliesWith || edge.is_self_loop() {
                continue;
            }
            if let Some(other) = edge.other_end(id) {
                let w = weights.entry(other.clone()).or_insert(0.0);
                *w = w.max(edge.weight);
            }
        }
        weights
    }

    /// Actors opposing or incompatible with `id`
    pub fn opponents(&self, id: &NodeId) -> Vec<NodeId> {
        let set: BTreeSet<NodeId> = self
            .layer
            .adjacent_edges(id)
            .into_iter()
            .filter(|e| matches!(e.edge_type, EdgeType::Opposes | EdgeType::Incompatible))
            .filter_map(|e| e.other_end(id).cloned())
            .filter(|other| other != id)
            .collect();
        set.into_iter().collect()
    }

    /// Allies within `max_depth` hops, strongest first
    ///
    /// A path's strength is the product of its edge weights, halved for each
    /// hop after the first. A direct ally therefore scores its full edge
    /// weight, and an ally two hops out scores `w1 * w2 * 0.5`. When several
    /// paths reach an ally the maximum wins.
    pub fn find_allies(&self, id: &NodeId, max_depth: usize) -> Vec<Ally> {
        let mut best: HashMap<NodeId, (f64, usize)> = HashMap::new();
        let mut queue: VecDeque<(NodeId, f64, usize)> = VecDeque::from([(id.clone(), 1.0, 0)]);

        while let Some((current, strength, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let decay = if depth == 0 { 1.0 } else { HOP_DECAY };
            for (neighbor, weight) in self.alliance_weights(&current) {
                if &neighbor == id {
                    continue;
                }
                let candidate = strength * weight * decay;
                let improves = best.get(&neighbor).map_or(true, |(s, _)| candidate > *s);
                if improves {
                    best.insert(neighbor.clone(), (candidate, depth + 1));
                    queue.push_back((neighbor, candidate, depth + 1));
                }
            }
        }

        let mut allies: Vec<Ally> = best
            .into_iter()
            .map(|(id, (strength, distance))| Ally {
                id,
                strength,
                distance,
            })
            .collect();
        allies.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        allies
    }

    /// Alliance blocks by synchronous label propagation over ALLIES_WITH
    ///
    /// Synchronous updates make the two members of an isolated allied pair
    /// swap labels every round, so any layer with such a pair comes back
    /// with `converged == false` after `max_iterations` rounds. The blocks
    /// are still reported from the final labels.
    pub fn detect_coalition_blocks(&self, max_iterations: usize) -> CoalitionBlocks {
        let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> = self
            .layer
            .node_ids()
            .into_iter()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();
        for edge in self.layer.edges_of_type(EdgeType::AlliesWith) {
            if edge.is_self_loop()
                || !adjacency.contains_key(&edge.source_id)
                || !adjacency.contains_key(&edge.target_id)
            {
                continue;
            }
            if let Some(set) = adjacency.get_mut(&edge.source_id) {
                set.insert(edge.target_id.clone());
            }
            if let Some(set) = adjacency.get_mut(&edge.target_id) {
                set.insert(edge.source_id.clone());
            }
        }

        let blocks: CoalitionBlocks = label_propagation(&adjacency, max_iterations).into();
        debug!(
            blocks = blocks.blocks.len(),
            converged = blocks.converged,
            "coalition blocks detected"
        );
        blocks
    }

    /// Alliance strength between two actors
    ///
    /// The direct alliance weight when one exists; otherwise the sum over
    /// shared direct allies of the product of both sides' weights, capped
    /// at 1. Symmetric in its arguments. An actor's strength with itself is 1.
    pub fn calculate_coalition_strength(&self, a: &NodeId, b: &NodeId) -> f64 {
        if a == b {
            return 1.0;
        }
        let from_a = self.alliance_weights(a);
        if let Some(direct) = from_a.get(b) {
            return *direct;
        }
        let from_b = self.alliance_weights(b);
        let shared: f64 = from_a
            .iter()
            .filter_map(|(ally, wa)| from_b.get(ally).map(|wb| wa * wb))
            .sum();
        shared.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, Node, NodeAttributes};

    fn member(id: &str) -> Node {
        Node::new(id, id, NodeAttributes::empty(NodeType::Member))
    }

    fn layer_with(edges: &[(&str, &str, EdgeType, f64)]) -> Layer {
        let mut layer = Layer::new(LayerName::Coalition);
        for (s, t, _, _) in edges {
            layer.add_node(member(s)).unwrap();
            layer.add_node(member(t)).unwrap();
        }
        for (s, t, kind, w) in edges {
            layer
                .add_edge(create_edge(*kind, &member(s), &member(t)).with_weight(*w))
                .unwrap();
        }
        layer
    }

    #[test]
    fn allies_decay_per_hop_and_take_the_best_path() {
        // a-b (0.2) direct, a-c-b via two strong links
        let layer = layer_with(&[
            ("a", "b", EdgeType::AlliesWith, 0.2),
            ("a", "c", EdgeType::AlliesWith, 1.0),
            ("c", "b", EdgeType::AlliesWith, 1.0),
            ("b", "d", EdgeType::AlliesWith, 1.0),
        ]);
        let view = CoalitionView::new(&layer).unwrap();
        let allies = view.find_allies(&NodeId::from("a"), 3);
        let get = |id: &str| allies.iter().find(|x| x.id.as_str() == id).unwrap();

        assert!((get("c").strength - 1.0).abs() < 1e-12);
        assert!((get("b").strength - 0.5).abs() < 1e-12);
        assert_eq!(get("b").distance, 2);
        assert!((get("d").strength - 0.25).abs() < 1e-12);
        assert!(allies.iter().all(|x| x.id.as_str() != "a"));
    }

    #[test]
    fn allies_respect_depth_bound() {
        let layer = layer_with(&[
            ("a", "b", EdgeType::AlliesWith, 1.0),
            ("b", "c", EdgeType::AlliesWith, 1.0),
        ]);
        let view = CoalitionView::new(&layer).unwrap();
        let allies = view.find_allies(&NodeId::from("a"), 1);
        assert_eq!(allies.len(), 1);
        assert_eq!(allies[0].id.as_str(), "b");
    }

    #[test]
    fn strength_is_direct_weight_or_shared_allies() {
        let layer = layer_with(&[
            ("a", "x", EdgeType::AlliesWith, 0.8),
            ("b", "x", EdgeType::AlliesWith, 0.5),
            ("a", "y", EdgeType::AlliesWith, 0.9),
            ("b", "y", EdgeType::AlliesWith, 0.9),
            ("a", "z", EdgeType::AlliesWith, 0.3),
        ]);
        let view = CoalitionView::new(&layer).unwrap();
        let (a, b) = (NodeId::from("a"), NodeId::from("b"));
        let expected = (0.8 * 0.5 + 0.9 * 0.9_f64).min(1.0);
        assert!((view.calculate_coalition_strength(&a, &b) - expected).abs() < 1e-12);
        assert_eq!(
            view.calculate_coalition_strength(&a, &b),
            view.calculate_coalition_strength(&b, &a)
        );
        assert!((view.calculate_coalition_strength(&a, &NodeId::from("z")) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn two_triangles_form_two_blocks() {
        let layer = layer_with(&[
            ("a", "b", EdgeType::AlliesWith, 1.0),
            ("b", "c", EdgeType::AlliesWith, 1.0),
            ("a", "c", EdgeType::AlliesWith, 1.0),
            ("d", "e", EdgeType::AlliesWith, 1.0),
            ("e", "f", EdgeType::AlliesWith, 1.0),
            ("d", "f", EdgeType::AlliesWith, 1.0),
            ("c", "d", EdgeType::Opposes, 1.0),
        ]);
        let view = CoalitionView::new(&layer).unwrap();
        let blocks = view.detect_coalition_blocks(100);
        assert!(blocks.converged);
        assert_eq!(blocks.blocks.len(), 2);
        assert!(blocks.blocks.iter().all(|b| b.len() == 3));
    }

    #[test]
    fn direct_allies_keep_their_full_weight() {
        let layer = layer_with(&[
            ("a", "b", EdgeType::AlliesWith, 0.6),
            ("b", "c", EdgeType::AlliesWith, 0.8),
        ]);
        let view = CoalitionView::new(&layer).unwrap();
        let allies = view.find_allies(&NodeId::from("a"), 2);
        assert_eq!(allies[0].id.as_str(), "b");
        assert_eq!(allies[0].strength, 0.6);
        assert_eq!(allies[0].distance, 1);
        assert!((allies[1].strength - 0.6 * 0.8 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn isolated_allied_pair_never_converges() {
        let layer = layer_with(&[("a", "b", EdgeType::AlliesWith, 1.0)]);
        let view = CoalitionView::new(&layer).unwrap();
        let blocks = view.detect_coalition_blocks(10);
        assert!(!blocks.converged);
        let members: usize = blocks.blocks.iter().map(Vec::len).sum();
        assert_eq!(members, 2);
    }

    #[test]
    fn opponents_and_sign_rules() {
        let mut layer = layer_with(&[
            ("a", "b", EdgeType::Opposes, 1.0),
            ("a", "c", EdgeType::Incompatible, 1.0),
        ]);
        let view = CoalitionView::new(&layer).unwrap();
        assert_eq!(
            view.opponents(&NodeId::from("a")),
            vec![NodeId::from("b"), NodeId::from("c")]
        );

        let bad = create_edge(EdgeType::AlliesWith, &member("b"), &member("c")).with_sign(Sign::Negative);
        let id = bad.id.clone();
        layer.add_edge(bad).unwrap();
        let report = layer.validate_semantics();
        assert!(!report.valid);
        assert!(report.mentions(id.as_str()));
    }
}
