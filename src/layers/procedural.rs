//! Procedural layer: how policy expressions are produced and carried

use super::endpoint_types;
use crate::graph::{
    EdgeType, Layer, LayerName, LayerPolicy, Node, NodeId, NodeType, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const NODE_TYPES: &[NodeType] = &[
    NodeType::Committee,
    NodeType::Subcommittee,
    NodeType::Agency,
    NodeType::PolicyExpression,
    NodeType::ProceduralVehicle,
    NodeType::Precedent,
    NodeType::TemporalWindow,
    NodeType::BudgetConstraint,
];

pub struct ProceduralPolicy;

impl LayerPolicy for ProceduralPolicy {
    fn name(&self) -> LayerName {
        LayerName::Procedural
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        8
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for edge in layer.edges_of_type(EdgeType::VehicleFor) {
            let (source, target) = endpoint_types(layer, edge);
            if source != NodeType::ProceduralVehicle || target != NodeType::PolicyExpression {
                issues.push(ValidationIssue::new(
                    "vehicle_for_direction",
                    &edge.id,
                    format!(
                        "VEHICLE_FOR must run PROCEDURAL_VEHICLE -> POLICY_EXPRESSION, found {} -> {}",
                        source, target
                    ),
                ));
            }
        }
        for edge in layer.edges_of_type(EdgeType::Produces) {
            let (_, target) = endpoint_types(layer, edge);
            if target != NodeType::PolicyExpression {
                issues.push(ValidationIssue::new(
                    "produces_target",
                    &edge.id,
                    format!("PRODUCES must target a POLICY_EXPRESSION, found {}", target),
                ));
            }
        }
        issues
    }
}

/// Everything that went into a policy expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionChain {
    pub expression_id: NodeId,
    /// Bodies that produced it
    pub producers: Vec<NodeId>,
    /// Vehicles that carry it
    pub vehicles: Vec<NodeId>,
    /// Expressions and precedents it references
    pub references: Vec<NodeId>,
    /// Windows and budgets constraining it or its vehicles
    pub constraints: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProceduralView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> ProceduralView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::Procedural).then_some(Self { layer })
    }

    fn sources_into(&self, id: &NodeId, edge_type: EdgeType) -> BTreeSet<NodeId> {
        self.layer
            .incoming_edges(id)
            .into_iter()
            .filter(|e| e.edge_type == edge_type)
            .map(|e| e.source_id.clone())
            .collect()
    }

    fn targets_from(&self, id: &NodeId, edge_type: EdgeType) -> BTreeSet<NodeId> {
        self.layer
            .outgoing_edges(id)
            .into_iter()
            .filter(|e| e.edge_type == edge_type)
            .map(|e| e.target_id.clone())
            .collect()
    }

    fn resolve(&self, ids: BTreeSet<NodeId>) -> Vec<&'a Node> {
        ids.iter().filter_map(|id| self.layer.get_node(id)).collect()
    }

    pub fn vehicles_for_expression(&self, expression_id: &NodeId) -> Vec<&'a Node> {
        self.resolve(self.sources_into(expression_id, EdgeType::VehicleFor))
    }

    pub fn expressions_for_vehicle(&self, vehicle_id: &NodeId) -> Vec<&'a Node> {
        self.resolve(self.targets_from(vehicle_id, EdgeType::VehicleFor))
    }

    /// Producers, enabling vehicles, references and constraints of an expression
    pub fn production_chain(&self, expression_id: &NodeId) -> ProductionChain {
        let vehicles = self.sources_into(expression_id, EdgeType::VehicleFor);

        let mut constraints = self.targets_from(expression_id, EdgeType::ConstrainedBy);
        for vehicle in &vehicles {
            constraints.extend(self.targets_from(vehicle, EdgeType::ConstrainedBy));
        }

        ProductionChain {
            expression_id: expression_id.clone(),
            producers: self
                .sources_into(expression_id, EdgeType::Produces)
                .into_iter()
                .collect(),
            references: self
                .targets_from(expression_id, EdgeType::References)
                .into_iter()
                .collect(),
            vehicles: vehicles.into_iter().collect(),
            constraints: constraints.into_iter().collect(),
        }
    }
}
