//! Adjacency index over a set of edges

use super::types::Direction;
use crate::graph::{Edge, NodeId};
use std::collections::HashMap;

/// Outgoing and incoming edge lists per node, each sorted by edge id
pub(crate) struct EdgeIndex<'a> {
    outgoing: HashMap<&'a NodeId, Vec<&'a Edge>>,
    incoming: HashMap<&'a NodeId, Vec<&'a Edge>>,
}

impl<'a> EdgeIndex<'a> {
    pub(crate) fn build(edges: impl Iterator<Item = &'a Edge>) -> Self {
        Self::filtered(edges, |_| true)
    }

    pub(crate) fn filtered(
        edges: impl Iterator<Item = &'a Edge>,
        keep: impl Fn(&Edge) -> bool,
    ) -> Self {
        let mut outgoing: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();
        let mut incoming: HashMap<&NodeId, Vec<&Edge>> = HashMap::new();

        for edge in edges.filter(|e| keep(e)) {
            outgoing.entry(&edge.source_id).or_default().push(edge);
            incoming.entry(&edge.target_id).or_default().push(edge);
        }
        for list in outgoing.values_mut().chain(incoming.values_mut()) {
            list.sort_by(|a, b| a.id.cmp(&b.id));
        }

        Self { outgoing, incoming }
    }

    pub(crate) fn outgoing(&self, node_id: &NodeId) -> &[&'a Edge] {
        self.outgoing
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn incoming(&self, node_id: &NodeId) -> &[&'a Edge] {
        self.incoming
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Edges that may be followed out of `node_id`, with the node each leads to
    ///
    /// Under [`Direction::Both`] a directed edge is only followed from its
    /// source; undirected edges are followed from either end.
    pub(crate) fn steps(&self, node_id: &NodeId, direction: Direction) -> Vec<(&'a Edge, &'a NodeId)> {
        match direction {
            Direction::Outgoing => self
                .outgoing(node_id)
                .iter()
                .map(|&e| (e, &e.target_id))
                .collect(),
            Direction::Incoming => self
                .incoming(node_id)
                .iter()
                .map(|&e| (e, &e.source_id))
                .collect(),
            Direction::Both => {
                let mut steps: Vec<(&Edge, &NodeId)> = self
                    .outgoing(node_id)
                    .iter()
                    .map(|&e| (e, &e.target_id))
                    .collect();
                steps.extend(
                    self.incoming(node_id)
                        .iter()
                        .filter(|e| !e.is_directed() && !e.is_self_loop())
                        .map(|&e| (e, &e.source_id)),
                );
                steps
            }
        }
    }
}
