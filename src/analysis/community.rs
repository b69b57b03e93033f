//! Label-propagation community detection

use crate::graph::{Layer, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Groups found by label propagation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communities {
    /// Each group sorted by id; largest group first
    pub groups: Vec<Vec<NodeId>>,
    /// False when the iteration cap was reached with labels still moving
    pub converged: bool,
    pub iterations: usize,
}

impl Communities {
    /// Index of the group containing `id`
    pub fn group_of(&self, id: &NodeId) -> Option<usize> {
        self.groups.iter().position(|g| g.binary_search(id).is_ok())
    }
}

/// Synchronous label propagation
///
/// Every node starts with its own label. Each round, all nodes adopt the
/// most frequent label among their neighbors, computed from the previous
/// round's labels. On a tie a node keeps its label if it is among the
/// tied ones, otherwise it takes the smallest. Nodes without neighbors keep
/// their label. Stops when a round changes nothing or after
/// `max_iterations` rounds.
///
/// Neighbors missing from the map's keys are ignored.
pub fn label_propagation(
    adjacency: &BTreeMap<NodeId, BTreeSet<NodeId>>,
    max_iterations: usize,
) -> Communities {
    let ids: Vec<&NodeId> = adjacency.keys().collect();
    let position: BTreeMap<&NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let neighbors: Vec<Vec<usize>> = adjacency
        .values()
        .map(|set| set.iter().filter_map(|n| position.get(n).copied()).collect())
        .collect();

    let mut labels: Vec<usize> = (0..ids.len()).collect();
    let mut converged = ids.is_empty();
    let mut iterations = 0;

    while !converged && iterations < max_iterations {
        iterations += 1;
        let next: Vec<usize> = labels
            .iter()
            .enumerate()
            .map(|(i, &current)| majority_label(current, &neighbors[i], &labels))
            .collect();
        converged = next == labels;
        labels = next;
    }

    let mut by_label: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_label.entry(*label).or_default().push(ids[i].clone());
    }
    let mut groups: Vec<Vec<NodeId>> = by_label.into_values().collect();
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    if converged {
        debug!(groups = groups.len(), iterations, "label propagation converged");
    } else {
        warn!(iterations, "label propagation stopped at iteration cap");
    }
    Communities {
        groups,
        converged,
        iterations,
    }
}

fn majority_label(current: usize, neighbors: &[usize], labels: &[usize]) -> usize {
    if neighbors.is_empty() {
        return current;
    }
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for n in neighbors {
        *counts.entry(labels[*n]).or_insert(0) += 1;
    }
    let best = counts.values().copied().max().unwrap_or(0);
    if counts.get(&current) == Some(&best) {
        return current;
    }
    // BTreeMap iterates in key order, so the first hit is the smallest label
    counts
        .into_iter()
        .find(|(_, c)| *c == best)
        .map_or(current, |(label, _)| label)
}

/// Communities of one layer over its undirected adjacency
pub fn layer_communities(layer: &Layer, max_iterations: usize) -> Communities {
    let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> = layer
        .node_ids()
        .into_iter()
        .map(|id| (id.clone(), BTreeSet::new()))
        .collect();
    for (node, neighbors) in layer.undirected_adjacency() {
        if let Some(set) = adjacency.get_mut(node) {
            set.extend(neighbors.into_iter().cloned());
        }
    }
    label_propagation(&adjacency, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)], isolated: &[&str]) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
        let mut adjacency: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for (a, b) in edges {
            adjacency.entry(NodeId::from(*a)).or_default().insert(NodeId::from(*b));
            adjacency.entry(NodeId::from(*b)).or_default().insert(NodeId::from(*a));
        }
        for id in isolated {
            adjacency.entry(NodeId::from(*id)).or_default();
        }
        adjacency
    }

    #[test]
    fn test_triangle_collapses_to_one_group() {
        let result = label_propagation(&graph(&[("a", "b"), ("b", "c"), ("a", "c")], &[]), 100);
        assert!(result.converged);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].len(), 3);
    }

    #[test]
    fn test_isolated_nodes_keep_their_own_label() {
        let result = label_propagation(&graph(&[], &["x", "y"]), 100);
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.groups, vec![vec![NodeId::from("x")], vec![NodeId::from("y")]]);
    }

    #[test]
    fn test_oscillating_pair_reports_not_converged() {
        // two nodes swap labels every synchronous round
        let result = label_propagation(&graph(&[("a", "b")], &[]), 10);
        assert!(!result.converged);
        assert_eq!(result.iterations, 10);
    }

    #[test]
    fn test_empty_graph_is_trivially_converged() {
        let result = label_propagation(&BTreeMap::new(), 100);
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert!(result.groups.is_empty());
    }

    #[test]
    fn test_group_lookup() {
        let result = label_propagation(&graph(&[("a", "b"), ("b", "c"), ("a", "c")], &["z"]), 100);
        assert_eq!(result.group_of(&NodeId::from("a")), Some(0));
        assert_eq!(result.group_of(&NodeId::from("z")), Some(1));
        assert_eq!(result.group_of(&NodeId::from("nope")), None);
    }
}
