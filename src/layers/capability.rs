//! Capability layer: what can be done about which risks

use super::endpoint_types;
use crate::graph::{
    EdgeType, Layer, LayerName, LayerPolicy, Node, NodeAttributes, NodeId, NodeType,
    ValidationIssue,
};
use std::collections::{BTreeSet, HashSet, VecDeque};

const NODE_TYPES: &[NodeType] = &[
    NodeType::Capability,
    NodeType::Implementation,
    NodeType::ProcurementPathway,
    NodeType::RiskCategory,
    NodeType::ExposureCategory,
    NodeType::IndustrySegment,
    NodeType::RiskThreshold,
];

const MITIGATIONS: [EdgeType; 2] = [EdgeType::ReducesFailureMode, EdgeType::ReducesRisk];

pub struct CapabilityPolicy;

impl LayerPolicy for CapabilityPolicy {
    fn name(&self) -> LayerName {
        LayerName::Capability
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        5
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for node in layer.nodes_of_type(NodeType::Capability) {
            if let NodeAttributes::Capability {
                is_exogenous: false,
                ..
            } = node.attributes
            {
                issues.push(ValidationIssue::new(
                    "capability_exogenous",
                    &node.id,
                    format!("capability {} is not marked exogenous", node.id),
                ));
            }
        }

        for edge in layer.edges_of_type(EdgeType::Implements) {
            let (source, target) = endpoint_types(layer, edge);
            if source != NodeType::Implementation || target != NodeType::Capability {
                issues.push(ValidationIssue::new(
                    "implements_direction",
                    &edge.id,
                    format!(
                        "IMPLEMENTS must run IMPLEMENTATION -> CAPABILITY, found {} -> {}",
                        source, target
                    ),
                ));
            }
        }
        issues
    }
}

/// Capability-specific queries over a capability layer
#[derive(Debug, Clone, Copy)]
pub struct CapabilityView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> CapabilityView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::Capability).then_some(Self { layer })
    }

    /// Capabilities with a mitigation edge into `risk_id`
    pub fn find_capabilities_for_risk(&self, risk_id: &NodeId) -> Vec<&'a Node> {
        let sources: BTreeSet<&NodeId> = self
            .layer
            .incoming_edges(risk_id)
            .into_iter()
            .filter(|e| MITIGATIONS.contains(&e.edge_type))
            .map(|e| &e.source_id)
            .collect();

        sources
            .into_iter()
            .filter_map(|id| self.layer.get_node(id))
            .filter(|n| n.node_type() == NodeType::Capability)
            .collect()
    }

    /// Fraction of `risk_ids` mitigated by at least one capability
    ///
    /// An empty risk set has coverage 0.
    pub fn calculate_coverage(&self, risk_ids: &[NodeId]) -> f64 {
        let unique: HashSet<&NodeId> = risk_ids.iter().collect();
        if unique.is_empty() {
            return 0.0;
        }
        let covered = unique
            .iter()
            .filter(|id| !self.find_capabilities_for_risk(id).is_empty())
            .count();
        covered as f64 / unique.len() as f64
    }

    /// Coverage over every risk category in the layer
    pub fn total_risk_coverage(&self) -> f64 {
        let risks: Vec<NodeId> = self
            .layer
            .nodes_of_type(NodeType::RiskCategory)
            .into_iter()
            .map(|n| n.id.clone())
            .collect();
        self.calculate_coverage(&risks)
    }

    /// Implementations that implement `capability_id`
    pub fn implementations_of(&self, capability_id: &NodeId) -> Vec<&'a Node> {
        self.layer
            .incoming_edges(capability_id)
            .into_iter()
            .filter(|e| e.edge_type == EdgeType::Implements)
            .filter_map(|e| self.layer.get_node(&e.source_id))
            .collect()
    }

    /// Everything `node_id` depends on, directly or transitively
    pub fn dependency_closure(&self, node_id: &NodeId) -> Vec<NodeId> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut queue = VecDeque::from([node_id.clone()]);
        while let Some(current) = queue.pop_front() {
            for edge in self.layer.outgoing_edges(&current) {
                if edge.edge_type == EdgeType::DependsOn
                    && &edge.target_id != node_id
                    && seen.insert(edge.target_id.clone())
                {
                    queue.push_back(edge.target_id.clone());
                }
            }
        }
        let mut out: Vec<NodeId> = seen.into_iter().collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::create_edge;

    fn node(id: &str, t: NodeType) -> Node {
        Node::new(id, id, NodeAttributes::empty(t))
    }

    fn sample() -> Layer {
        let mut layer = Layer::new(LayerName::Capability);
        let cap = node("cap", NodeType::Capability);
        let cap2 = node("cap2", NodeType::Capability);
        let imp = node("impl", NodeType::Implementation);
        let r1 = node("r1", NodeType::RiskCategory);
        let r2 = node("r2", NodeType::RiskCategory);
        for n in [&cap, &cap2, &imp, &r1, &r2] {
            layer.add_node(n.clone()).unwrap();
        }
        layer.add_edge(create_edge(EdgeType::ReducesFailureMode, &cap, &r1)).unwrap();
        layer.add_edge(create_edge(EdgeType::ReducesRisk, &cap2, &r1)).unwrap();
        layer.add_edge(create_edge(EdgeType::Implements, &imp, &cap)).unwrap();
        layer.add_edge(create_edge(EdgeType::DependsOn, &cap, &cap2)).unwrap();
        layer
    }

    #[test]
    fn finds_mitigating_capabilities() {
        let layer = sample();
        let view = CapabilityView::new(&layer).unwrap();
        let caps: Vec<&str> = view
            .find_capabilities_for_risk(&NodeId::from("r1"))
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(caps, vec!["cap", "cap2"]);
        assert!(view.find_capabilities_for_risk(&NodeId::from("r2")).is_empty());
    }

    #[test]
    fn coverage_is_fraction_of_mitigated_risks() {
        let layer = sample();
        let view = CapabilityView::new(&layer).unwrap();
        let risks = [NodeId::from("r1"), NodeId::from("r2")];
        assert!((view.calculate_coverage(&risks) - 0.5).abs() < 1e-12);
        assert_eq!(view.calculate_coverage(&[]), 0.0);
        assert!((view.total_risk_coverage() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn implementations_and_dependencies() {
        let layer = sample();
        let view = CapabilityView::new(&layer).unwrap();
        assert_eq!(view.implementations_of(&NodeId::from("cap")).len(), 1);
        assert_eq!(view.dependency_closure(&NodeId::from("cap")), vec![NodeId::from("cap2")]);
    }

    #[test]
    fn endogenous_capability_fails_validation() {
        let mut layer = sample();
        layer
            .add_node(Node::new(
                "cap-endo",
                "endogenous",
                NodeAttributes::Capability {
                    is_exogenous: false,
                    maturity: None,
                },
            ))
            .unwrap();
        let report = layer.validate_semantics();
        assert!(!report.valid);
        assert!(report.mentions("cap-endo"));
    }

    #[test]
    fn view_rejects_other_layers() {
        let layer = Layer::new(LayerName::Coalition);
        assert!(CapabilityView::new(&layer).is_none());
    }
}
