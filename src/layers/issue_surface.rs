//! Issue-surface layer: how capabilities surface as policy issues

use super::{endpoint_types, jaccard};
use crate::graph::{
    EdgeType, Layer, LayerName, LayerPolicy, NodeAttributes, NodeId, NodeType, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const NODE_TYPES: &[NodeType] = &[
    NodeType::Capability,
    NodeType::IssueSurface,
    NodeType::PolicyArea,
    NodeType::ExposureCategory,
    NodeType::SalienceIndicator,
];

pub struct IssueSurfacePolicy;

impl LayerPolicy for IssueSurfacePolicy {
    fn name(&self) -> LayerName {
        LayerName::IssueSurface
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        5
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let checks = [
            (
                EdgeType::MapsTo,
                NodeType::Capability,
                NodeType::IssueSurface,
                "maps_to_direction",
            ),
            (
                EdgeType::RoutesTo,
                NodeType::IssueSurface,
                NodeType::PolicyArea,
                "routes_to_direction",
            ),
        ];
        let mut issues = Vec::new();
        for (edge_type, want_source, want_target, rule) in checks {
            for edge in layer.edges_of_type(edge_type) {
                let (source, target) = endpoint_types(layer, edge);
                if source != want_source || target != want_target {
                    issues.push(ValidationIssue::new(
                        rule,
                        &edge.id,
                        format!(
                            "{} must run {} -> {}, found {} -> {}",
                            edge_type, want_source, want_target, source, target
                        ),
                    ));
                }
            }
        }
        issues
    }
}

/// One capability -> issue surface -> policy area chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPath {
    pub capability_id: NodeId,
    pub issue_surface_id: NodeId,
    /// None when the issue surface is not yet routed anywhere
    pub policy_area_id: Option<NodeId>,
}

#[derive(Debug, Clone, Copy)]
pub struct IssueSurfaceView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> IssueSurfaceView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::IssueSurface).then_some(Self { layer })
    }

    /// Every routing chain starting at `capability_id`
    pub fn build_routing_path(&self, capability_id: &NodeId) -> Vec<RoutingPath> {
        let mut paths = Vec::new();
        for maps in self.layer.outgoing_edges(capability_id) {
            if maps.edge_type != EdgeType::MapsTo {
                continue;
            }
            let routes: Vec<NodeId> = self
                .layer
                .outgoing_edges(&maps.target_id)
                .into_iter()
                .filter(|e| e.edge_type == EdgeType::RoutesTo)
                .map(|e| e.target_id.clone())
                .collect();

            if routes.is_empty() {
                paths.push(RoutingPath {
                    capability_id: capability_id.clone(),
                    issue_surface_id: maps.target_id.clone(),
                    policy_area_id: None,
                });
            }
            for area in routes {
                paths.push(RoutingPath {
                    capability_id: capability_id.clone(),
                    issue_surface_id: maps.target_id.clone(),
                    policy_area_id: Some(area),
                });
            }
        }
        paths
    }

    fn keywords(&self, id: &NodeId) -> BTreeSet<String> {
        match self.layer.get_node(id).map(|n| &n.attributes) {
            Some(NodeAttributes::IssueSurface { keywords, .. }) => {
                keywords.iter().map(|k| k.trim().to_lowercase()).collect()
            }
            _ => BTreeSet::new(),
        }
    }

    /// Jaccard similarity of two issue surfaces' keyword sets
    ///
    /// Case-insensitive. 0 when both sets are empty or either node is not
    /// an issue surface in this layer.
    pub fn keyword_similarity(&self, a: &NodeId, b: &NodeId) -> f64 {
        jaccard(&self.keywords(a), &self.keywords(b))
    }

    /// Other issue surfaces at or above `threshold` similarity, most similar first
    pub fn similar_issue_surfaces(&self, id: &NodeId, threshold: f64) -> Vec<(NodeId, f64)> {
        let mut similar: Vec<(NodeId, f64)> = self
            .layer
            .nodes_of_type(NodeType::IssueSurface)
            .into_iter()
            .filter(|n| &n.id != id)
            .map(|n| (n.id.clone(), self.keyword_similarity(id, &n.id)))
            .filter(|(_, s)| *s > 0.0 && *s >= threshold)
            .collect();
        similar.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        similar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, Node};

    fn surface(id: &str, keywords: &[&str]) -> Node {
        Node::new(
            id,
            id,
            NodeAttributes::IssueSurface {
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                salience: None,
            },
        )
    }

    fn node(id: &str, t: NodeType) -> Node {
        Node::new(id, id, NodeAttributes::empty(t))
    }

    fn sample() -> Layer {
        let mut layer = Layer::new(LayerName::IssueSurface);
        let cap = node("cap", NodeType::Capability);
        let s1 = surface("s1", &["Supply Chain", "sbom", "vendors"]);
        let s2 = surface("s2", &["sbom", "vendors", "open source", "licensing"]);
        let s3 = surface("s3", &[]);
        let area = node("area", NodeType::PolicyArea);
        for n in [&cap, &s1, &s2, &s3, &area] {
            layer.add_node(n.clone()).unwrap();
        }
        layer.add_edge(create_edge(EdgeType::MapsTo, &cap, &s1)).unwrap();
        layer.add_edge(create_edge(EdgeType::MapsTo, &cap, &s3)).unwrap();
        layer.add_edge(create_edge(EdgeType::RoutesTo, &s1, &area)).unwrap();
        layer
    }

    #[test]
    fn routing_paths_include_unrouted_surfaces() {
        let layer = sample();
        let view = IssueSurfaceView::new(&layer).unwrap();
        let mut paths = view.build_routing_path(&NodeId::from("cap"));
        paths.sort_by(|a, b| a.issue_surface_id.cmp(&b.issue_surface_id));
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].policy_area_id, Some(NodeId::from("area")));
        assert_eq!(paths[1].policy_area_id, None);
    }

    #[test]
    fn keyword_similarity_is_case_insensitive_jaccard() {
        let layer = sample();
        let view = IssueSurfaceView::new(&layer).unwrap();
        // {supply chain, sbom, vendors} vs {sbom, vendors, open source, licensing}
        let s = view.keyword_similarity(&NodeId::from("s1"), &NodeId::from("s2"));
        assert!((s - 2.0 / 5.0).abs() < 1e-12);
        assert_eq!(view.keyword_similarity(&NodeId::from("s3"), &NodeId::from("s3")), 0.0);
    }

    #[test]
    fn similar_surfaces_exclude_self_and_zero_overlap() {
        let layer = sample();
        let view = IssueSurfaceView::new(&layer).unwrap();
        let similar = view.similar_issue_surfaces(&NodeId::from("s1"), 0.1);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].0, NodeId::from("s2"));
    }

    #[test]
    fn reversed_routes_to_is_reported() {
        let mut layer = sample();
        let area = node("area", NodeType::PolicyArea);
        let mut edge = create_edge(EdgeType::RoutesTo, &area, &surface("s2", &[]));
        edge.source_type = NodeType::IssueSurface;
        edge.target_type = NodeType::PolicyArea;
        let id = edge.id.clone();
        layer.add_edge(edge).unwrap();
        let report = layer.validate_semantics();
        assert!(report.mentions(id.as_str()));
        assert!(report.errors.iter().any(|e| e.rule == "routes_to_direction"));
    }
}
