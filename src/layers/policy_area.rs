//! Policy-area layer: the topic hierarchy

use crate::graph::{
    Layer, LayerName, LayerPolicy, Node, NodeAttributes, NodeId, NodeType, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const NODE_TYPES: &[NodeType] = &[NodeType::PolicyArea, NodeType::Precedent];

fn parent_of(node: &Node) -> Option<&NodeId> {
    match &node.attributes {
        NodeAttributes::PolicyArea { parent_id, .. } => parent_id.as_ref(),
        _ => None,
    }
}

pub struct PolicyAreaPolicy;

impl LayerPolicy for PolicyAreaPolicy {
    fn name(&self) -> LayerName {
        LayerName::PolicyArea
    }

    fn allowed_node_types(&self) -> &'static [NodeType] {
        NODE_TYPES
    }

    fn default_max_depth(&self) -> usize {
        10
    }

    fn validate_semantics(&self, layer: &Layer) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for area in layer.nodes_of_type(NodeType::PolicyArea) {
            let Some(parent) = parent_of(area) else {
                continue;
            };
            let parent_is_area = layer
                .get_node(parent)
                .map_or(false, |p| p.node_type() == NodeType::PolicyArea);
            if !parent_is_area {
                issues.push(ValidationIssue::new(
                    "policy_area_parent",
                    &area.id,
                    format!("parent {} of {} is not a policy area in this layer", parent, area.id),
                ));
            }
        }

        let view = PolicyAreaView { layer };
        for area in layer.nodes_of_type(NodeType::PolicyArea) {
            if view.on_parent_cycle(&area.id) {
                issues.push(ValidationIssue::new(
                    "policy_area_cycle",
                    &area.id,
                    format!("{} is its own ancestor", area.id),
                ));
            }
        }
        issues
    }
}

/// A policy area and its sub-areas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaTree {
    pub id: NodeId,
    pub name: String,
    pub children: Vec<AreaTree>,
}

impl AreaTree {
    /// Number of areas in this subtree, including the root
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(AreaTree::size).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyAreaView<'a> {
    pub(crate) layer: &'a Layer,
}

impl<'a> PolicyAreaView<'a> {
    pub fn new(layer: &'a Layer) -> Option<Self> {
        (layer.name() == LayerName::PolicyArea).then_some(Self { layer })
    }

    /// Areas with no parent, or whose parent is absent from the layer
    pub fn root_areas(&self) -> Vec<&'a Node> {
        self.layer
            .nodes_of_type(NodeType::PolicyArea)
            .into_iter()
            .filter(|n| parent_of(n).map_or(true, |p| !self.layer.contains_node(p)))
            .collect()
    }

    fn children_index(&self) -> BTreeMap<&'a NodeId, Vec<&'a Node>> {
        let mut children: BTreeMap<&NodeId, Vec<&Node>> = BTreeMap::new();
        for area in self.layer.nodes_of_type(NodeType::PolicyArea) {
            if let Some(parent) = parent_of(area) {
                children.entry(parent).or_default().push(area);
            }
        }
        children
    }

    /// Forest of areas built from parent pointers
    ///
    /// Areas caught in a parent cycle have no root and do not appear.
    pub fn build_hierarchy(&self) -> Vec<AreaTree> {
        let children = self.children_index();
        let mut seen = HashSet::new();
        self.root_areas()
            .into_iter()
            .map(|root| Self::subtree(root, &children, &mut seen))
            .collect()
    }

    fn subtree(
        node: &Node,
        children: &BTreeMap<&NodeId, Vec<&Node>>,
        seen: &mut HashSet<NodeId>,
    ) -> AreaTree {
        seen.insert(node.id.clone());
        let kids = children
            .get(&node.id)
            .map(|list| {
                list.iter()
                    .filter(|c| !seen.contains(&c.id))
                    .copied()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        AreaTree {
            id: node.id.clone(),
            name: node.name.clone(),
            children: kids
                .into_iter()
                .map(|c| Self::subtree(c, children, seen))
                .collect(),
        }
    }

    /// Parent chain from the immediate parent upward
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id.clone()]);
        let mut current = self.layer.get_node(id).and_then(parent_of);
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = self.layer.get_node(parent).and_then(parent_of);
        }
        chain
    }

    fn on_parent_cycle(&self, id: &NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.layer.get_node(id).and_then(parent_of);
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            current = self.layer.get_node(parent).and_then(parent_of);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(id: &str, parent: Option<&str>) -> Node {
        Node::new(
            id,
            id,
            NodeAttributes::PolicyArea {
                parent_id: parent.map(NodeId::from),
                level: None,
            },
        )
    }

    fn sample() -> Layer {
        let mut layer = Layer::new(LayerName::PolicyArea);
        layer.add_node(area("security", None)).unwrap();
        layer.add_node(area("cyber", Some("security"))).unwrap();
        layer.add_node(area("supply-chain", Some("cyber"))).unwrap();
        layer.add_node(area("privacy", Some("security"))).unwrap();
        layer.add_node(area("health", None)).unwrap();
        layer
    }

    #[test]
    fn hierarchy_from_parent_pointers() {
        let layer = sample();
        let view = PolicyAreaView::new(&layer).unwrap();
        let roots = view.build_hierarchy();
        assert_eq!(roots.len(), 2);
        let security = roots.iter().find(|t| t.id.as_str() == "security").unwrap();
        assert_eq!(security.size(), 4);
        assert_eq!(security.children.len(), 2);
    }

    #[test]
    fn ancestors_walk_up_the_chain() {
        let layer = sample();
        let view = PolicyAreaView::new(&layer).unwrap();
        assert_eq!(
            view.ancestors(&NodeId::from("supply-chain")),
            vec![NodeId::from("cyber"), NodeId::from("security")]
        );
    }

    #[test]
    fn parent_cycle_is_reported_and_guarded() {
        let mut layer = Layer::new(LayerName::PolicyArea);
        layer.add_node(area("a", Some("b"))).unwrap();
        layer.add_node(area("b", Some("a"))).unwrap();
        layer.add_node(area("c", Some("missing"))).unwrap();

        let report = layer.validate_semantics();
        assert!(report.mentions("a"));
        assert!(report.mentions("b"));
        assert!(report.errors.iter().any(|e| e.rule == "policy_area_parent" && e.id == "c"));

        let view = PolicyAreaView::new(&layer).unwrap();
        assert_eq!(view.ancestors(&NodeId::from("a")), vec![NodeId::from("b")]);
        let roots = view.build_hierarchy();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, NodeId::from("c"));
    }
}
