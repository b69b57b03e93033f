//! Jurisdiction layer: who holds authority over which policy areas

use super::{endpoint_types, jaccard};
use crate::graph::{
    EdgeType, Layer, LayerName, LayerPolicy, NodeAttributes, NodeId, NodeType, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

const NODE_TYPES: &[NodeType] = &[
    NodeType::Member,
    NodeType::Committee,
    NodeType::Subcommittee,
    NodeType::Agency,
    NodeType::SubAgency,
    NodeType::OversightBody,
    NodeType::PolicyArea,
    NodeType::JurisdictionalAuthority,
];

pub struct JurisdictionPolicy;

impl LayerPolicy for JurisdictionPolicy {
    fn name(&self) -> LayerName {
        LayerName::Jurisdiction
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        6
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for edge in layer.edges_of_type(EdgeType::Delegates) {
            let pair = endpoint_types(layer, edge);
            let legal = matches!(
                pair,
                (NodeType::Committee, NodeType::Subcommittee)
                    | (NodeType::Agency, NodeType::SubAgency)
            );
            if !legal {
                issues.push(ValidationIssue::new(
                    "delegation_hierarchy",
                    &edge.id,
                    format!(
                        "DELEGATES must run COMMITTEE -> SUBCOMMITTEE or AGENCY -> SUB_AGENCY, found {} -> {}",
                        pair.0, pair.1
                    ),
                ));
            }
        }

        for sub in layer.nodes_of_type(NodeType::Subcommittee) {
            if let NodeAttributes::Subcommittee {
                parent_committee_id: Some(parent),
                ..
            } = &sub.attributes
            {
                let ok = layer
                    .get_node(parent)
                    .map_or(false, |p| p.node_type() == NodeType::Committee);
                if !ok {
                    issues.push(ValidationIssue::new(
                        "subcommittee_parent",
                        &sub.id,
                        format!("parent committee {} of {} is not in this layer", parent, sub.id),
                    ));
                }
            }
        }
        issues
    }
}

/// A body holding jurisdiction over a policy area, with its authorities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityHolder {
    pub id: NodeId,
    pub node_type: NodeType,
    pub authorities: Vec<NodeId>,
}

/// Policy area -> jurisdiction holders -> exercised authorities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityChain {
    pub policy_area_id: NodeId,
    pub holders: Vec<AuthorityHolder>,
}

#[derive(Debug, Clone, Copy)]
pub struct JurisdictionView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> JurisdictionView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::Jurisdiction).then_some(Self { layer })
    }

    /// Authorities exercised by `holder_id`
    pub fn authorities_of(&self, holder_id: &NodeId) -> BTreeSet<NodeId> {
        self.layer
            .outgoing_edges(holder_id)
            .into_iter()
            .filter(|e| e.edge_type == EdgeType::Exercises)
            .map(|e| e.target_id.clone())
            .collect()
    }

    /// Resolve who holds jurisdiction over `policy_area_id` and what they exercise
    pub fn authority_chain(&self, policy_area_id: &NodeId) -> AuthorityChain {
        let holder_ids: BTreeSet<&NodeId> = self
            .layer
            .incoming_edges(policy_area_id)
            .into_iter()
            .filter(|e| e.edge_type == EdgeType::HasJurisdiction)
            .map(|e| &e.source_id)
            .collect();

        let holders = holder_ids
            .into_iter()
            .filter_map(|id| self.layer.get_node(id))
            .map(|holder| AuthorityHolder {
                id: holder.id.clone(),
                node_type: holder.node_type(),
                authorities: self.authorities_of(&holder.id).into_iter().collect(),
            })
            .collect();

        AuthorityChain {
            policy_area_id: policy_area_id.clone(),
            holders,
        }
    }

    /// The committee plus every subcommittee reachable through delegation
    pub fn delegated_bodies(&self, committee_id: &NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::from([committee_id.clone()]);
        let mut order = vec![committee_id.clone()];
        let mut queue = VecDeque::from([committee_id.clone()]);
        while let Some(current) = queue.pop_front() {
            for edge in self.layer.outgoing_edges(&current) {
                if edge.edge_type == EdgeType::Delegates && seen.insert(edge.target_id.clone()) {
                    order.push(edge.target_id.clone());
                    queue.push_back(edge.target_id.clone());
                }
            }
        }
        order
    }

    /// Members of a committee, including members of its delegated subcommittees
    pub fn committee_members(&self, committee_id: &NodeId) -> Vec<NodeId> {
        let mut members = BTreeSet::new();
        for body in self.delegated_bodies(committee_id) {
            for edge in self.layer.incoming_edges(&body) {
                if edge.edge_type == EdgeType::MemberOf {
                    members.insert(edge.source_id.clone());
                }
            }
        }
        members.into_iter().collect()
    }

    /// Jaccard index of two bodies' authority sets
    pub fn jurisdiction_overlap(&self, a: &NodeId, b: &NodeId) -> f64 {
        jaccard(&self.authorities_of(a), &self.authorities_of(b))
    }

    /// Pairs of authority holders whose overlap is at least `threshold`
    pub fn overlapping_jurisdictions(&self, threshold: f64) -> Vec<(NodeId, NodeId, f64)> {
        let holders: Vec<&NodeId> = self
            .layer
            .edges_of_type(EdgeType::Exercises)
            .into_iter()
            .map(|e| &e.source_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut pairs = Vec::new();
        for (i, a) in holders.iter().enumerate() {
            for b in &holders[i + 1..] {
                let overlap = self.jurisdiction_overlap(a, b);
                if overlap > 0.0 && overlap >= threshold {
                    pairs.push(((*a).clone(), (*b).clone(), overlap));
                }
            }
        }
        pairs.sort_by(|x, y| y.2.partial_cmp(&x.2).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }
}
