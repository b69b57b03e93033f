//! Shared fixtures for integration tests
//!
//! Builds small multiplex networks from readable id/type pairs.

#![allow(dead_code)]

use multiplex::graph::{
    create_edge, Edge, EdgeType, MultiplexNetwork, Node, NodeAttributes, NodeType, Sign,
};
use multiplex::EngineConfig;
use std::collections::HashMap;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route library logs to the test harness's captured output
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Fluent builder for test networks
///
/// Nodes are registered by id first; edges then refer to them by id and
/// take their endpoint types from the registered nodes.
#[derive(Default)]
pub struct NetworkBuilder {
    config: EngineConfig,
    nodes: Vec<Node>,
    by_id: HashMap<String, Node>,
    edges: Vec<Edge>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn node(self, id: &str, node_type: NodeType) -> Self {
        self.custom_node(Node::new(id, id, NodeAttributes::empty(node_type)))
    }

    pub fn nodes(mut self, ids: &[&str], node_type: NodeType) -> Self {
        for id in ids {
            self = self.node(id, node_type);
        }
        self
    }

    pub fn custom_node(mut self, node: Node) -> Self {
        self.by_id.insert(node.id.as_str().to_string(), node.clone());
        self.nodes.push(node);
        self
    }

    pub fn edge(self, edge_type: EdgeType, from: &str, to: &str) -> Self {
        self.edge_with(edge_type, from, to, |e| e)
    }

    pub fn signed(self, edge_type: EdgeType, from: &str, to: &str, sign: Sign) -> Self {
        self.edge_with(edge_type, from, to, |e| e.with_sign(sign))
    }

    pub fn edge_with(
        mut self,
        edge_type: EdgeType,
        from: &str,
        to: &str,
        adjust: impl FnOnce(Edge) -> Edge,
    ) -> Self {
        let source = &self.by_id[from];
        let target = &self.by_id[to];
        let id = format!("{}:{}->{}", edge_type.as_str(), from, to);
        let edge = adjust(create_edge(edge_type, source, target).with_id(id));
        self.edges.push(edge);
        self
    }

    pub fn build(self) -> MultiplexNetwork {
        let mut network = MultiplexNetwork::with_config(self.config);
        for node in self.nodes {
            network
                .add_node_to_layers(node)
                .expect("fixture node should fit a layer");
        }
        for edge in self.edges {
            network.add_edge(edge).expect("fixture edge should be valid");
        }
        network
    }
}

/// Three coalition members: A-B and B-C allied, A-C joined by `closing`
pub fn coalition_triangle(closing: EdgeType) -> MultiplexNetwork {
    NetworkBuilder::new()
        .nodes(&["A", "B", "C"], NodeType::Member)
        .edge(EdgeType::AlliesWith, "A", "B")
        .edge(EdgeType::AlliesWith, "B", "C")
        .edge(closing, "A", "C")
        .build()
}

/// A small institution touching every layer
///
/// A committee with jurisdiction over a policy area produces an expression
/// carried by a vehicle; a member sits on the committee, allies with a
/// colleague and is briefed by staff; a capability maps to an issue surface
/// routed to the same policy area.
pub fn institution() -> MultiplexNetwork {
    NetworkBuilder::new()
        .node("committee:hsgac", NodeType::Committee)
        .node("subcommittee:hsgac-ps", NodeType::Subcommittee)
        .node("area:cyber", NodeType::PolicyArea)
        .node("area:cyber-infra", NodeType::PolicyArea)
        .node("authority:oversight", NodeType::JurisdictionalAuthority)
        .node("member:smith", NodeType::Member)
        .node("member:jones", NodeType::Member)
        .node("staff:lee", NodeType::Staff)
        .node("expr:bill-101", NodeType::PolicyExpression)
        .node("vehicle:ndaa", NodeType::ProceduralVehicle)
        .node("window:fy25", NodeType::TemporalWindow)
        .node("cap:zero-trust", NodeType::Capability)
        .node("impl:zt-gateway", NodeType::Implementation)
        .node("risk:intrusion", NodeType::RiskCategory)
        .node("surface:fed-networks", NodeType::IssueSurface)
        .edge(EdgeType::HasJurisdiction, "committee:hsgac", "area:cyber")
        .edge(EdgeType::Exercises, "committee:hsgac", "authority:oversight")
        .edge(EdgeType::Delegates, "committee:hsgac", "subcommittee:hsgac-ps")
        .edge(EdgeType::MemberOf, "member:smith", "committee:hsgac")
        .edge(EdgeType::Contains, "area:cyber", "area:cyber-infra")
        .edge(EdgeType::Produces, "committee:hsgac", "expr:bill-101")
        .edge(EdgeType::VehicleFor, "vehicle:ndaa", "expr:bill-101")
        .edge(EdgeType::ConstrainedBy, "vehicle:ndaa", "window:fy25")
        .edge(EdgeType::AlliesWith, "member:smith", "member:jones")
        .edge(EdgeType::Briefs, "staff:lee", "member:smith")
        .edge(EdgeType::Informs, "member:smith", "member:jones")
        .edge(EdgeType::Implements, "impl:zt-gateway", "cap:zero-trust")
        .edge(EdgeType::ReducesRisk, "cap:zero-trust", "risk:intrusion")
        .edge(EdgeType::MapsTo, "cap:zero-trust", "surface:fed-networks")
        .edge(EdgeType::RoutesTo, "surface:fed-networks", "area:cyber")
        .build()
}
