//! Structural balance of signed layers
//!
//! Two distinct quantities are reported. The *frustration index* is the
//! number of triangles with an odd count of negative edges; it is cheap and
//! bounds the sign-flip count from above. The *minimum flip frustration* is
//! the fewest edges whose sign disagrees with the best two-way partition of
//! the nodes, found exhaustively for small layers and by local search above
//! [`EXACT_NODE_LIMIT`].
//!
//! Both treat the layer as undirected and ignore self-loops. Neutral edges
//! count as non-negative. When parallel edges join the same pair, a negative
//! one makes the pair negative.

use crate::graph::{Layer, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Largest node count solved by exhaustive bipartition
pub const EXACT_NODE_LIMIT: usize = 20;

/// Triangle census of a signed layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleAnalysis {
    pub total_triangles: usize,
    /// Triangles with 0 or 2 negative edges
    pub balanced_triangles: usize,
    /// Triangles with 1 or 3 negative edges
    pub frustrated_triangles: usize,
    /// `1 - frustrated / total`, or 1 when there are no triangles
    pub balance_ratio: f64,
}

/// Best two-way partition found for the sign-flip problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipPartition {
    /// Edges disagreeing with the partition
    pub frustration: usize,
    /// True when every partition was examined
    pub exact: bool,
    /// Positive edges across the cut and negative edges within a side
    pub frustrated_edges: Vec<(NodeId, NodeId)>,
    pub clusters: [Vec<NodeId>; 2],
}

/// Full balance report for one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralBalance {
    /// True iff `min_flip_frustration` is 0
    pub is_balanced: bool,
    /// Count of frustrated triangles
    pub frustration_index: usize,
    pub min_flip_frustration: usize,
    pub exact: bool,
    pub frustrated_edges: Vec<(NodeId, NodeId)>,
    pub balance_ratio: f64,
    pub triangles: TriangleAnalysis,
    pub clusters: [Vec<NodeId>; 2],
}

/// Undirected signed pairs keyed `(lo, hi)`; the value is "negative"
struct SignedPairs {
    nodes: Vec<NodeId>,
    pairs: BTreeMap<(NodeId, NodeId), bool>,
    neighbors: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl SignedPairs {
    fn from_layer(layer: &Layer) -> Self {
        let mut pairs: BTreeMap<(NodeId, NodeId), bool> = BTreeMap::new();
        let mut neighbors: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for edge in layer.edges() {
            if edge.is_self_loop() {
                continue;
            }
            let (lo, hi) = if edge.source_id < edge.target_id {
                (edge.source_id.clone(), edge.target_id.clone())
            } else {
                (edge.target_id.clone(), edge.source_id.clone())
            };
            neighbors.entry(lo.clone()).or_default().insert(hi.clone());
            neighbors.entry(hi.clone()).or_default().insert(lo.clone());
            let negative = pairs.entry((lo, hi)).or_insert(false);
            *negative |= edge.sign.is_negative();
        }
        let nodes = neighbors.keys().cloned().collect();
        Self {
            nodes,
            pairs,
            neighbors,
        }
    }

    fn negative(&self, a: &NodeId, b: &NodeId) -> Option<bool> {
        let key = if a < b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        self.pairs.get(&key).copied()
    }

    fn triangles(&self) -> TriangleAnalysis {
        let mut total = 0;
        let mut frustrated = 0;
        for ((u, v), uv_negative) in &self.pairs {
            let (Some(nu), Some(nv)) = (self.neighbors.get(u), self.neighbors.get(v)) else {
                continue;
            };
            // u < v < w, so each triangle is seen once
            for w in nu.intersection(nv).filter(|w| *w > v) {
                let negatives = [
                    *uv_negative,
                    self.negative(u, w).unwrap_or(false),
                    self.negative(v, w).unwrap_or(false),
                ]
                .iter()
                .filter(|n| **n)
                .count();
                total += 1;
                if negatives % 2 == 1 {
                    frustrated += 1;
                }
            }
        }
        TriangleAnalysis {
            total_triangles: total,
            balanced_triangles: total - frustrated,
            frustrated_triangles: frustrated,
            balance_ratio: if total == 0 {
                1.0
            } else {
                1.0 - frustrated as f64 / total as f64
            },
        }
    }

    /// Pairs whose sign disagrees with the side assignment
    fn frustrated_under(&self, side: &BTreeMap<&NodeId, bool>) -> Vec<(NodeId, NodeId)> {
        self.pairs
            .iter()
            .filter(|((a, b), negative)| {
                let same = side.get(a) == side.get(b);
                same == **negative
            })
            .map(|((a, b), _)| (a.clone(), b.clone()))
            .collect()
    }

    fn count_under(&self, side: &[bool], index: &BTreeMap<&NodeId, usize>) -> usize {
        self.pairs
            .iter()
            .filter(|((a, b), negative)| {
                let same = side[index[a]] == side[index[b]];
                same == **negative
            })
            .count()
    }

    fn best_partition(&self) -> FlipPartition {
        let n = self.nodes.len();
        let index: BTreeMap<&NodeId, usize> =
            self.nodes.iter().enumerate().map(|(i, id)| (id, i)).collect();

        let (side, exact) = if n <= EXACT_NODE_LIMIT {
            (self.exhaustive(&index), true)
        } else {
            (self.local_search(&index), false)
        };

        let by_id: BTreeMap<&NodeId, bool> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id, side.get(i).copied().unwrap_or(false)))
            .collect();
        let frustrated_edges = self.frustrated_under(&by_id);
        let mut clusters: [Vec<NodeId>; 2] = [Vec::new(), Vec::new()];
        for (id, s) in &by_id {
            clusters[usize::from(*s)].push((*id).clone());
        }
        FlipPartition {
            frustration: frustrated_edges.len(),
            exact,
            frustrated_edges,
            clusters,
        }
    }

    fn exhaustive(&self, index: &BTreeMap<&NodeId, usize>) -> Vec<bool> {
        let n = self.nodes.len();
        if n == 0 {
            return Vec::new();
        }
        // node 0 stays on side false; mirrored partitions are equivalent
        let mut best_side = vec![false; n];
        let mut best = self.count_under(&best_side, index);
        let mut side = vec![false; n];
        for mask in 1u32..(1u32 << (n - 1)) {
            if best == 0 {
                break;
            }
            for (i, s) in side.iter_mut().enumerate().skip(1) {
                *s = mask & (1 << (i - 1)) != 0;
            }
            let count = self.count_under(&side, index);
            if count < best {
                best = count;
                best_side.clone_from(&side);
            }
        }
        best_side
    }

    /// Sign-respecting BFS colouring, then single-node moves while they help
    fn local_search(&self, index: &BTreeMap<&NodeId, usize>) -> Vec<bool> {
        let n = self.nodes.len();
        let mut side = vec![false; n];
        let mut placed = vec![false; n];
        for start in 0..n {
            if placed[start] {
                continue;
            }
            placed[start] = true;
            let mut queue = std::collections::VecDeque::from([start]);
            while let Some(i) = queue.pop_front() {
                for next in self.neighbors.get(&self.nodes[i]).into_iter().flatten() {
                    let j = index[next];
                    if placed[j] {
                        continue;
                    }
                    let negative = self.negative(&self.nodes[i], next).unwrap_or(false);
                    side[j] = side[i] ^ negative;
                    placed[j] = true;
                    queue.push_back(j);
                }
            }
        }

        let mut current = self.count_under(&side, index);
        for _ in 0..n {
            let mut improved = false;
            for i in 0..n {
                side[i] = !side[i];
                let count = self.count_under(&side, index);
                if count < current {
                    current = count;
                    improved = true;
                } else {
                    side[i] = !side[i];
                }
            }
            if !improved {
                break;
            }
        }
        side
    }
}

/// Count balanced and frustrated triangles in `layer`
pub fn analyze_triangles(layer: &Layer) -> TriangleAnalysis {
    SignedPairs::from_layer(layer).triangles()
}

/// Number of frustrated triangles
pub fn frustration_index(layer: &Layer) -> usize {
    analyze_triangles(layer).frustrated_triangles
}

/// Fewest sign disagreements over two-way node partitions
pub fn min_flip_frustration(layer: &Layer) -> FlipPartition {
    SignedPairs::from_layer(layer).best_partition()
}

/// Triangles plus the sign-flip partition for one layer
pub fn structural_balance(layer: &Layer) -> StructuralBalance {
    let pairs = SignedPairs::from_layer(layer);
    let triangles = pairs.triangles();
    let partition = pairs.best_partition();
    debug!(
        layer = %layer.name(),
        triangles = triangles.total_triangles,
        frustrated = triangles.frustrated_triangles,
        min_flip = partition.frustration,
        exact = partition.exact,
        "structural balance computed"
    );
    StructuralBalance {
        is_balanced: partition.frustration == 0,
        frustration_index: triangles.frustrated_triangles,
        min_flip_frustration: partition.frustration,
        exact: partition.exact,
        frustrated_edges: partition.frustrated_edges,
        balance_ratio: triangles.balance_ratio,
        triangles,
        clusters: partition.clusters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, EdgeType, LayerName, Node, NodeAttributes, NodeType};

    fn member(id: &str) -> Node {
        Node::new(id, id, NodeAttributes::empty(NodeType::Member))
    }

    fn coalition(edges: &[(&str, &str, EdgeType)]) -> Layer {
        let mut layer = Layer::new(LayerName::Coalition);
        for (a, b, kind) in edges {
            layer.add_node(member(a)).unwrap();
            layer.add_node(member(b)).unwrap();
            layer.add_edge(create_edge(*kind, &member(a), &member(b))).unwrap();
        }
        layer
    }

    #[test]
    fn test_one_negative_edge_frustrates_the_triangle() {
        let layer = coalition(&[
            ("a", "b", EdgeType::AlliesWith),
            ("b", "c", EdgeType::AlliesWith),
            ("a", "c", EdgeType::Opposes),
        ]);
        let t = analyze_triangles(&layer);
        assert_eq!(t.total_triangles, 1);
        assert_eq!(t.frustrated_triangles, 1);
        assert_eq!(t.balance_ratio, 0.0);

        let report = structural_balance(&layer);
        assert!(!report.is_balanced);
        assert_eq!(report.min_flip_frustration, 1);
        assert!(report.exact);
        assert_eq!(report.frustrated_edges.len(), 1);
    }

    #[test]
    fn test_two_negative_edges_balance_the_triangle() {
        let layer = coalition(&[
            ("a", "b", EdgeType::AlliesWith),
            ("b", "c", EdgeType::Opposes),
            ("a", "c", EdgeType::Opposes),
        ]);
        let report = structural_balance(&layer);
        assert_eq!(report.frustration_index, 0);
        assert_eq!(report.balance_ratio, 1.0);
        assert!(report.is_balanced);
        let mut clusters = report.clusters.clone();
        clusters.sort();
        assert_eq!(clusters[0], vec![NodeId::from("a"), NodeId::from("b")]);
        assert_eq!(clusters[1], vec![NodeId::from("c")]);
    }

    #[test]
    fn test_no_triangles_means_ratio_one() {
        let layer = coalition(&[("a", "b", EdgeType::Opposes)]);
        let t = analyze_triangles(&layer);
        assert_eq!(t.total_triangles, 0);
        assert_eq!(t.balance_ratio, 1.0);
        assert_eq!(frustration_index(&layer), 0);
    }

    #[test]
    fn test_negative_parallel_edge_dominates() {
        let layer = coalition(&[
            ("a", "b", EdgeType::AlliesWith),
            ("a", "b", EdgeType::Opposes),
            ("b", "c", EdgeType::AlliesWith),
            ("a", "c", EdgeType::AlliesWith),
        ]);
        assert_eq!(frustration_index(&layer), 1);
    }

    #[test]
    fn test_large_layers_fall_back_to_local_search() {
        // a balanced ring of 24 allies
        let ids: Vec<String> = (0..24).map(|i| format!("n{:02}", i)).collect();
        let edges: Vec<(&str, &str, EdgeType)> = (0..24)
            .map(|i| (ids[i].as_str(), ids[(i + 1) % 24].as_str(), EdgeType::AlliesWith))
            .collect();
        let partition = min_flip_frustration(&coalition(&edges));
        assert!(!partition.exact);
        assert_eq!(partition.frustration, 0);
    }

    #[test]
    fn test_empty_layer_is_balanced() {
        let report = structural_balance(&Layer::new(LayerName::Coalition));
        assert!(report.is_balanced);
        assert_eq!(report.triangles.total_triangles, 0);
    }
}
