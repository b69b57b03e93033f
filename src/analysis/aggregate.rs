//! Directed, weighted projection of a network or layer

use crate::graph::{Edge, Layer, MultiplexNetwork, NodeId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A simple directed graph over node identities
///
/// Directed edges keep their orientation; undirected edges contribute both
/// arcs. Parallel arcs collapse into one carrying the largest weight.
/// Self-loops are dropped.
#[derive(Debug, Clone, Default)]
pub struct AggregateGraph {
    nodes: BTreeSet<NodeId>,
    succ: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
    pred: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
}

impl AggregateGraph {
    /// Project every layer onto one graph
    pub fn from_network(network: &MultiplexNetwork) -> Self {
        let mut graph = Self::default();
        for layer in network.layers() {
            graph.absorb(layer);
        }
        graph
    }

    pub fn from_layer(layer: &Layer) -> Self {
        let mut graph = Self::default();
        graph.absorb(layer);
        graph
    }

    fn absorb(&mut self, layer: &Layer) {
        for node in layer.nodes() {
            self.nodes.insert(node.id.clone());
        }
        for edge in layer.edges() {
            self.add_edge(edge);
        }
    }

    fn add_edge(&mut self, edge: &Edge) {
        if edge.is_self_loop() {
            return;
        }
        self.add_arc(&edge.source_id, &edge.target_id, edge.weight);
        if !edge.is_directed() {
            self.add_arc(&edge.target_id, &edge.source_id, edge.weight);
        }
    }

    fn add_arc(&mut self, from: &NodeId, to: &NodeId, weight: f64) {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        let w = self
            .succ
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_insert(weight);
        *w = w.max(weight);
        let w = self
            .pred
            .entry(to.clone())
            .or_default()
            .entry(from.clone())
            .or_insert(weight);
        *w = w.max(weight);
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = (&NodeId, f64)> {
        self.succ.get(id).into_iter().flatten().map(|(n, w)| (n, *w))
    }

    pub fn predecessors(&self, id: &NodeId) -> impl Iterator<Item = (&NodeId, f64)> {
        self.pred.get(id).into_iter().flatten().map(|(n, w)| (n, *w))
    }

    pub fn out_degree(&self, id: &NodeId) -> usize {
        self.succ.get(id).map_or(0, BTreeMap::len)
    }

    pub fn in_degree(&self, id: &NodeId) -> usize {
        self.pred.get(id).map_or(0, BTreeMap::len)
    }

    pub fn has_arc(&self, from: &NodeId, to: &NodeId) -> bool {
        self.succ.get(from).map_or(false, |s| s.contains_key(to))
    }

    /// Shortest directed hop distance to every node reachable within `max_hops`
    ///
    /// The origin itself is included at distance 0.
    pub fn distances(&self, origin: &NodeId, max_hops: usize) -> BTreeMap<NodeId, usize> {
        self.bfs(origin, max_hops, &self.succ)
    }

    /// Like [`distances`](Self::distances), walking arcs backwards
    pub fn upstream_distances(&self, origin: &NodeId, max_hops: usize) -> BTreeMap<NodeId, usize> {
        self.bfs(origin, max_hops, &self.pred)
    }

    fn bfs(
        &self,
        origin: &NodeId,
        max_hops: usize,
        arcs: &BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
    ) -> BTreeMap<NodeId, usize> {
        let mut dist = BTreeMap::new();
        if !self.contains(origin) {
            return dist;
        }
        dist.insert(origin.clone(), 0);
        let mut queue = VecDeque::from([(origin.clone(), 0usize)]);
        while let Some((current, d)) = queue.pop_front() {
            if d >= max_hops {
                continue;
            }
            for next in arcs.get(&current).into_iter().flat_map(BTreeMap::keys) {
                if !dist.contains_key(next) {
                    dist.insert(next.clone(), d + 1);
                    queue.push_back((next.clone(), d + 1));
                }
            }
        }
        dist
    }

    /// Nodes reachable from `origin` by at least one arc
    pub fn descendants(&self, origin: &NodeId) -> BTreeSet<NodeId> {
        let mut reached: BTreeSet<NodeId> = self
            .distances(origin, usize::MAX)
            .into_keys()
            .collect();
        // the origin counts only if a cycle leads back to it
        let returns = self
            .predecessors(origin)
            .any(|(p, _)| reached.contains(p));
        if !returns {
            reached.remove(origin);
        }
        reached
    }

    /// Components of the graph with arcs treated as undirected
    ///
    /// `keep` decides which arcs connect. Components are sorted internally
    /// and listed largest first.
    pub fn weak_components(&self, keep: impl Fn(f64) -> bool) -> Vec<Vec<NodeId>> {
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut components = Vec::new();
        for start in &self.nodes {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start.clone()];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                let around = self.successors(current).chain(self.predecessors(current));
                for (next, weight) in around {
                    if keep(weight) && seen.insert(next) {
                        component.push(next.clone());
                        queue.push_back(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, EdgeType, LayerName, Node, NodeAttributes, NodeType};

    fn staff(id: &str) -> Node {
        Node::new(id, id, NodeAttributes::empty(NodeType::Staff))
    }

    #[test]
    fn undirected_edges_become_two_arcs() {
        let mut layer = Layer::new(LayerName::Coalition);
        let a = Node::new("a", "a", NodeAttributes::empty(NodeType::Member));
        let b = Node::new("b", "b", NodeAttributes::empty(NodeType::Member));
        layer.add_node(a.clone()).unwrap();
        layer.add_node(b.clone()).unwrap();
        layer.add_edge(create_edge(EdgeType::AlliesWith, &a, &b)).unwrap();
        let graph = AggregateGraph::from_layer(&layer);
        assert!(graph.has_arc(&a.id, &b.id));
        assert!(graph.has_arc(&b.id, &a.id));
    }

    #[test]
    fn descendants_exclude_origin_unless_on_a_cycle() {
        let mut layer = Layer::new(LayerName::InformationFlow);
        for id in ["a", "b", "c"] {
            layer.add_node(staff(id)).unwrap();
        }
        layer.add_edge(create_edge(EdgeType::Informs, &staff("a"), &staff("b"))).unwrap();
        layer.add_edge(create_edge(EdgeType::Informs, &staff("b"), &staff("c"))).unwrap();
        let graph = AggregateGraph::from_layer(&layer);
        assert_eq!(graph.descendants(&NodeId::from("a")).len(), 2);

        layer.add_edge(create_edge(EdgeType::Informs, &staff("c"), &staff("a"))).unwrap();
        let graph = AggregateGraph::from_layer(&layer);
        assert!(graph.descendants(&NodeId::from("a")).contains(&NodeId::from("a")));
    }

    #[test]
    fn weak_components_honor_the_arc_filter() {
        let mut layer = Layer::new(LayerName::InformationFlow);
        for id in ["a", "b", "c"] {
            layer.add_node(staff(id)).unwrap();
        }
        layer.add_edge(create_edge(EdgeType::Informs, &staff("a"), &staff("b"))).unwrap();
        layer
            .add_edge(create_edge(EdgeType::Informs, &staff("b"), &staff("c")).with_weight(0.1))
            .unwrap();
        let graph = AggregateGraph::from_layer(&layer);
        assert_eq!(graph.weak_components(|_| true).len(), 1);
        let strong = graph.weak_components(|w| w >= 0.5);
        assert_eq!(strong.len(), 2);
        assert_eq!(strong[0], vec![NodeId::from("a"), NodeId::from("b")]);
    }
}
