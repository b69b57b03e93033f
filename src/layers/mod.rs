//! The seven layer policies and their typed views
//!
//! Each module contributes a unit-struct [`LayerPolicy`] (membership, depth,
//! traversal and semantic rules) and a borrowed view exposing the queries
//! that only make sense for that layer.

pub mod capability;
pub mod coalition;
pub mod information_flow;
pub mod issue_surface;
pub mod jurisdiction;
pub mod policy_area;
pub mod procedural;

pub use capability::{CapabilityPolicy, CapabilityView};
pub use coalition::{Ally, CoalitionBlocks, CoalitionPolicy, CoalitionView};
pub use information_flow::{Betweenness, InformationFlowPolicy, InformationFlowView};
pub use issue_surface::{IssueSurfacePolicy, IssueSurfaceView, RoutingPath};
pub use jurisdiction::{AuthorityChain, AuthorityHolder, JurisdictionPolicy, JurisdictionView};
pub use policy_area::{AreaTree, PolicyAreaPolicy, PolicyAreaView};
pub use procedural::{ProceduralPolicy, ProceduralView, ProductionChain};

use crate::graph::{Edge, Layer, LayerName, LayerPolicy, NodeType};
use std::collections::BTreeSet;

pub(crate) fn policy_for(name: LayerName) -> &'static dyn LayerPolicy {
    match name {
        LayerName::Capability => &CapabilityPolicy,
        LayerName::IssueSurface => &IssueSurfacePolicy,
        LayerName::PolicyArea => &PolicyAreaPolicy,
        LayerName::Jurisdiction => &JurisdictionPolicy,
        LayerName::Procedural => &ProceduralPolicy,
        LayerName::Coalition => &CoalitionPolicy,
        LayerName::InformationFlow => &InformationFlowPolicy,
    }
}

/// Endpoint types of `edge`, preferring the stored node's actual type
pub(crate) fn endpoint_types(layer: &Layer, edge: &Edge) -> (NodeType, NodeType) {
    let source = layer
        .get_node(&edge.source_id)
        .map_or(edge.source_type, |n| n.node_type());
    let target = layer
        .get_node(&edge.target_id)
        .map_or(edge.target_type, |n| n.node_type());
    (source, target)
}

/// `|a ∩ b| / |a ∪ b|`, or 0 when both are empty
pub(crate) fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
