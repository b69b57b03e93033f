//! Static validity table and entity constructors
//!
//! Every edge type has exactly one rule naming its host layer, the node
//! types allowed at each end, and the direction and sign an edge gets when
//! the caller does not override them.

use super::edge::{Edge, EdgeDirection, EdgeId, EdgeType, Sign};
use super::layer::LayerName;
use super::node::{Node, NodeAttributes, NodeId, NodeType};
use serde::Serialize;
use thiserror::Error;

use EdgeDirection::{Directed, Undirected};
use NodeType::*;

const COALITION_ACTORS: &[NodeType] = &[Member, Committee, Subcommittee, Agency, IndustrySegment];

const FLOW_ACTORS: &[NodeType] = &[
    Member,
    Committee,
    Subcommittee,
    Staff,
    Agency,
    SubAgency,
    OversightBody,
];

const JURISDICTION_HOLDERS: &[NodeType] = &[Committee, Subcommittee, Agency, SubAgency];

const AUTHORITY_HOLDERS: &[NodeType] = &[Committee, Subcommittee, Agency, SubAgency, OversightBody];

const CAPABILITY_OR_IMPL: &[NodeType] = &[Capability, Implementation];

/// One row of the validity table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRule {
    pub edge_type: EdgeType,
    pub layer: LayerName,
    pub sources: &'static [NodeType],
    pub targets: &'static [NodeType],
    pub direction: EdgeDirection,
    pub sign: Sign,
}

impl EdgeRule {
    /// Whether `(source, target)` is an allowed endpoint pair
    pub fn admits(&self, source: NodeType, target: NodeType) -> bool {
        self.sources.contains(&source) && self.targets.contains(&target)
    }
}

const fn rule(
    edge_type: EdgeType,
    layer: LayerName,
    sources: &'static [NodeType],
    targets: &'static [NodeType],
    direction: EdgeDirection,
    sign: Sign,
) -> EdgeRule {
    EdgeRule {
        edge_type,
        layer,
        sources,
        targets,
        direction,
        sign,
    }
}

impl EdgeType {
    /// The validity table entry for this type
    pub fn rule(&self) -> EdgeRule {
        use LayerName as L;
        use Sign::{Negative as Neg, Neutral as Neu, Positive as Pos};
        let t = *self;
        match t {
            EdgeType::Implements => rule(t, L::Capability, &[Implementation], &[Capability], Directed, Pos),
            EdgeType::ReducesFailureMode => rule(t, L::Capability, &[Capability], &[RiskCategory], Directed, Pos),
            EdgeType::ReducesRisk => rule(
                t,
                L::Capability,
                CAPABILITY_OR_IMPL,
                &[RiskCategory, ExposureCategory],
                Directed,
                Pos,
            ),
            EdgeType::DependsOn => rule(t, L::Capability, CAPABILITY_OR_IMPL, CAPABILITY_OR_IMPL, Directed, Pos),
            EdgeType::ProcuredVia => rule(t, L::Capability, &[Implementation], &[ProcurementPathway], Directed, Neu),
            EdgeType::MapsTo => rule(t, L::IssueSurface, &[Capability], &[IssueSurface], Directed, Pos),
            EdgeType::RoutesTo => rule(t, L::IssueSurface, &[IssueSurface], &[PolicyArea], Directed, Pos),
            EdgeType::Exposes => rule(t, L::IssueSurface, &[IssueSurface], &[ExposureCategory], Directed, Neg),
            EdgeType::RelatedTo => rule(t, L::IssueSurface, &[IssueSurface], &[IssueSurface], Undirected, Neu),
            EdgeType::Contains => rule(t, L::PolicyArea, &[PolicyArea], &[PolicyArea], Directed, Neu),
            EdgeType::HasJurisdiction => rule(t, L::Jurisdiction, JURISDICTION_HOLDERS, &[PolicyArea], Directed, Pos),
            EdgeType::Exercises => rule(
                t,
                L::Jurisdiction,
                AUTHORITY_HOLDERS,
                &[JurisdictionalAuthority],
                Directed,
                Pos,
            ),
            EdgeType::Delegates => rule(
                t,
                L::Jurisdiction,
                &[Committee, Agency],
                &[Subcommittee, SubAgency],
                Directed,
                Pos,
            ),
            EdgeType::Oversees => rule(
                t,
                L::Jurisdiction,
                &[OversightBody, Committee, Subcommittee],
                &[Agency, SubAgency],
                Directed,
                Neu,
            ),
            EdgeType::MemberOf => rule(t, L::Jurisdiction, &[Member], &[Committee, Subcommittee], Directed, Pos),
            EdgeType::Produces => rule(
                t,
                L::Procedural,
                &[Committee, Subcommittee, Agency],
                &[PolicyExpression],
                Directed,
                Pos,
            ),
            EdgeType::VehicleFor => rule(t, L::Procedural, &[ProceduralVehicle], &[PolicyExpression], Directed, Pos),
            EdgeType::References => rule(
                t,
                L::Procedural,
                &[PolicyExpression],
                &[PolicyExpression, Precedent],
                Directed,
                Neu,
            ),
            EdgeType::ConstrainedBy => rule(
                t,
                L::Procedural,
                &[ProceduralVehicle, PolicyExpression],
                &[TemporalWindow, BudgetConstraint],
                Directed,
                Neg,
            ),
            EdgeType::AlliesWith => rule(t, L::Coalition, COALITION_ACTORS, COALITION_ACTORS, Undirected, Pos),
            EdgeType::Opposes => rule(t, L::Coalition, COALITION_ACTORS, COALITION_ACTORS, Undirected, Neg),
            EdgeType::Compatible => rule(t, L::Coalition, COALITION_ACTORS, COALITION_ACTORS, Undirected, Pos),
            EdgeType::Incompatible => rule(t, L::Coalition, COALITION_ACTORS, COALITION_ACTORS, Undirected, Neg),
            EdgeType::Informs => rule(t, L::InformationFlow, FLOW_ACTORS, FLOW_ACTORS, Directed, Pos),
            EdgeType::Briefs => rule(
                t,
                L::InformationFlow,
                &[Staff, Agency, SubAgency],
                &[Member, Committee, Subcommittee],
                Directed,
                Pos,
            ),
            EdgeType::Signals => rule(
                t,
                L::InformationFlow,
                &[SalienceIndicator, MemoryMarker],
                FLOW_ACTORS,
                Directed,
                Neu,
            ),
        }
    }
}

/// Edge types whose host layer is `layer`
pub fn edge_types_for_layer(layer: LayerName) -> Vec<EdgeType> {
    EdgeType::ALL
        .iter()
        .copied()
        .filter(|t| t.rule().layer == layer)
        .collect()
}

/// A data problem found by [`validate_edge`]
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeViolation {
    #[error("edge {edge_id}: {edge_type} does not allow {source_type} -> {target_type}")]
    EndpointTypes {
        edge_id: EdgeId,
        edge_type: EdgeType,
        source_type: NodeType,
        target_type: NodeType,
    },

    #[error("edge {edge_id}: {edge_type} belongs in layer {expected}, not {declared}")]
    WrongLayer {
        edge_id: EdgeId,
        edge_type: EdgeType,
        expected: LayerName,
        declared: LayerName,
    },

    #[error("edge {edge_id}: weight {value} outside [0, 1]")]
    WeightOutOfRange { edge_id: EdgeId, value: f64 },

    #[error("edge {edge_id}: confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange { edge_id: EdgeId, value: f64 },
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Check an edge against the validity table
///
/// Returns every violation found; an empty list means the edge is valid.
pub fn validate_edge(edge: &Edge) -> Vec<EdgeViolation> {
    let rule = edge.edge_type.rule();
    let mut violations = Vec::new();

    if !rule.admits(edge.source_type, edge.target_type) {
        violations.push(EdgeViolation::EndpointTypes {
            edge_id: edge.id.clone(),
            edge_type: edge.edge_type,
            source_type: edge.source_type,
            target_type: edge.target_type,
        });
    }
    if rule.layer != edge.layer {
        violations.push(EdgeViolation::WrongLayer {
            edge_id: edge.id.clone(),
            edge_type: edge.edge_type,
            expected: rule.layer,
            declared: edge.layer,
        });
    }
    if !in_unit_range(edge.weight) {
        violations.push(EdgeViolation::WeightOutOfRange {
            edge_id: edge.id.clone(),
            value: edge.weight,
        });
    }
    if !in_unit_range(edge.confidence) {
        violations.push(EdgeViolation::ConfidenceOutOfRange {
            edge_id: edge.id.clone(),
            value: edge.confidence,
        });
    }
    violations
}

/// Create a node with a fresh id
pub fn create_node(attributes: NodeAttributes, name: impl Into<String>) -> Node {
    Node::new(NodeId::new(), name, attributes)
}

/// Create an edge between two nodes, taking endpoint types from the nodes
///
/// The result is not checked here; pass it to [`validate_edge`] or insert
/// it and run layer validation.
pub fn create_edge(edge_type: EdgeType, source: &Node, target: &Node) -> Edge {
    Edge::between(
        edge_type,
        source.id.clone(),
        source.node_type(),
        target.id.clone(),
        target.node_type(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, t: NodeType) -> Node {
        Node::new(id, id, NodeAttributes::empty(t))
    }

    #[test]
    fn every_layer_hosts_at_least_one_edge_type() {
        for layer in LayerName::ALL {
            assert!(!edge_types_for_layer(layer).is_empty(), "{layer}");
        }
        let total: usize = LayerName::ALL
            .iter()
            .map(|l| edge_types_for_layer(*l).len())
            .sum();
        assert_eq!(total, EdgeType::ALL.len());
    }

    #[test]
    fn table_endpoints_are_allowed_in_host_layer() {
        for t in EdgeType::ALL {
            let rule = t.rule();
            let allowed = rule.layer.allowed_node_types();
            for s in rule.sources.iter().chain(rule.targets) {
                assert!(allowed.contains(s), "{t}: {s} not allowed in {}", rule.layer);
            }
        }
    }

    #[test]
    fn valid_edge_has_no_violations() {
        let imp = node("impl", NodeType::Implementation);
        let cap = node("cap", NodeType::Capability);
        let edge = create_edge(EdgeType::Implements, &imp, &cap);
        assert!(validate_edge(&edge).is_empty());
    }

    #[test]
    fn reversed_endpoints_are_reported() {
        let imp = node("impl", NodeType::Implementation);
        let cap = node("cap", NodeType::Capability);
        let edge = create_edge(EdgeType::Implements, &cap, &imp);
        let violations = validate_edge(&edge);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], EdgeViolation::EndpointTypes { .. }));
    }

    #[test]
    fn out_of_range_weight_and_layer_override_are_reported() {
        let a = node("a", NodeType::Member);
        let b = node("b", NodeType::Member);
        let edge = create_edge(EdgeType::AlliesWith, &a, &b)
            .with_weight(1.5)
            .with_confidence(-0.1)
            .with_layer(LayerName::InformationFlow);
        let violations = validate_edge(&edge);
        assert_eq!(violations.len(), 3);
        assert!(violations
            .iter()
            .any(|v| matches!(v, EdgeViolation::WrongLayer { .. })));
    }

    #[test]
    fn create_node_assigns_fresh_ids() {
        let a = create_node(NodeAttributes::empty(NodeType::Agency), "A");
        let b = create_node(NodeAttributes::empty(NodeType::Agency), "A");
        assert_ne!(a.id, b.id);
        assert_eq!(a.node_type(), NodeType::Agency);
    }
}
