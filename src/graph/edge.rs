//! Signed, typed edges and inter-layer couplings

use super::engine::MultiplexError;
use super::layer::LayerName;
use super::node::{Metadata, NodeId, NodeType, Provenance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Closed taxonomy of relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Implements,
    ReducesFailureMode,
    ReducesRisk,
    DependsOn,
    ProcuredVia,
    MapsTo,
    RoutesTo,
    Exposes,
    RelatedTo,
    Contains,
    HasJurisdiction,
    Exercises,
    Delegates,
    Oversees,
    MemberOf,
    Produces,
    VehicleFor,
    References,
    ConstrainedBy,
    AlliesWith,
    Opposes,
    Compatible,
    Incompatible,
    Informs,
    Briefs,
    Signals,
}

impl EdgeType {
    pub const ALL: [EdgeType; 26] = [
        EdgeType::Implements,
        EdgeType::ReducesFailureMode,
        EdgeType::ReducesRisk,
        EdgeType::DependsOn,
        EdgeType::ProcuredVia,
        EdgeType::MapsTo,
        EdgeType::RoutesTo,
        EdgeType::Exposes,
        EdgeType::RelatedTo,
        EdgeType::Contains,
        EdgeType::HasJurisdiction,
        EdgeType::Exercises,
        EdgeType::Delegates,
        EdgeType::Oversees,
        EdgeType::MemberOf,
        EdgeType::Produces,
        EdgeType::VehicleFor,
        EdgeType::References,
        EdgeType::ConstrainedBy,
        EdgeType::AlliesWith,
        EdgeType::Opposes,
        EdgeType::Compatible,
        EdgeType::Incompatible,
        EdgeType::Informs,
        EdgeType::Briefs,
        EdgeType::Signals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Implements => "IMPLEMENTS",
            EdgeType::ReducesFailureMode => "REDUCES_FAILURE_MODE",
            EdgeType::ReducesRisk => "REDUCES_RISK",
            EdgeType::DependsOn => "DEPENDS_ON",
            EdgeType::ProcuredVia => "PROCURED_VIA",
            EdgeType::MapsTo => "MAPS_TO",
            EdgeType::RoutesTo => "ROUTES_TO",
            EdgeType::Exposes => "EXPOSES",
            EdgeType::RelatedTo => "RELATED_TO",
            EdgeType::Contains => "CONTAINS",
            EdgeType::HasJurisdiction => "HAS_JURISDICTION",
            EdgeType::Exercises => "EXERCISES",
            EdgeType::Delegates => "DELEGATES",
            EdgeType::Oversees => "OVERSEES",
            EdgeType::MemberOf => "MEMBER_OF",
            EdgeType::Produces => "PRODUCES",
            EdgeType::VehicleFor => "VEHICLE_FOR",
            EdgeType::References => "REFERENCES",
            EdgeType::ConstrainedBy => "CONSTRAINED_BY",
            EdgeType::AlliesWith => "ALLIES_WITH",
            EdgeType::Opposes => "OPPOSES",
            EdgeType::Compatible => "COMPATIBLE",
            EdgeType::Incompatible => "INCOMPATIBLE",
            EdgeType::Informs => "INFORMS",
            EdgeType::Briefs => "BRIEFS",
            EdgeType::Signals => "SIGNALS",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EdgeType {
    type Err = MultiplexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MultiplexError::UnknownType(format!("edge type {}", s)))
    }
}

/// Whether an edge has an orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    Directed,
    Undirected,
}

/// Edge sign for structural-balance analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Neutral,
}

impl Sign {
    pub fn is_negative(&self) -> bool {
        matches!(self, Sign::Negative)
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sign::Positive => f.write_str("positive"),
            Sign::Negative => f.write_str("negative"),
            Sign::Neutral => f.write_str("neutral"),
        }
    }
}

fn default_unit() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// A typed, signed relation living in exactly one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub source_id: NodeId,
    pub target_id: NodeId,
    /// Declared endpoint types, checked against the validity table
    pub source_type: NodeType,
    pub target_type: NodeType,
    pub direction: EdgeDirection,
    pub sign: Sign,
    pub layer: LayerName,
    /// Relation strength in [0, 1]
    #[serde(default = "default_unit")]
    pub weight: f64,
    /// Confidence in the relation in [0, 1]
    #[serde(default = "default_unit")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Edge {
    /// Create an edge between two typed endpoints
    ///
    /// Direction, sign and layer come from the validity table entry for
    /// `edge_type`; weight and confidence start at 1.
    pub fn between(
        edge_type: EdgeType,
        source_id: NodeId,
        source_type: NodeType,
        target_id: NodeId,
        target_type: NodeType,
    ) -> Self {
        let rule = edge_type.rule();
        let now = Utc::now();
        Self {
            id: EdgeId::new(),
            edge_type,
            source_id,
            target_id,
            source_type,
            target_type,
            direction: rule.direction,
            sign: rule.sign,
            layer: rule.layer,
            weight: 1.0,
            confidence: 1.0,
            metadata: HashMap::new(),
            provenance: None,
            created_at: now,
            updated_at: now,
            valid_from: None,
            valid_to: None,
            active: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<EdgeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_layer(mut self, layer: LayerName) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }

    pub fn with_direction(mut self, direction: EdgeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn is_directed(&self) -> bool {
        self.direction == EdgeDirection::Directed
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }

    /// Whether `node` is either endpoint
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source_id == node || &self.target_id == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.source_id == node {
            Some(&self.target_id)
        } else if &self.target_id == node {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

/// Deterministic id for the coupling of `node_id` between two layers
///
/// Order of the layers does not matter.
pub fn coupling_id(node_id: &NodeId, a: LayerName, b: LayerName) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let key = format!("{}|{}|{}", node_id, lo, hi);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

/// Couples one node identity across two of the layers it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterLayerEdge {
    pub id: String,
    pub node_id: NodeId,
    pub source_layer: LayerName,
    pub target_layer: LayerName,
    /// In [0, 1]
    pub coupling_strength: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl InterLayerEdge {
    /// Create a coupling with the deterministic id for its (node, layer pair)
    pub fn new(
        node_id: NodeId,
        source_layer: LayerName,
        target_layer: LayerName,
        coupling_strength: f64,
    ) -> Self {
        let id = coupling_id(&node_id, source_layer, target_layer);
        Self {
            id,
            node_id,
            source_layer,
            target_layer,
            coupling_strength: clamp_unit(coupling_strength),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// The unordered layer pair this coupling joins
    pub fn layer_pair(&self) -> (LayerName, LayerName) {
        if self.source_layer <= self.target_layer {
            (self.source_layer, self.target_layer)
        } else {
            (self.target_layer, self.source_layer)
        }
    }

    pub fn connects_layer(&self, layer: LayerName) -> bool {
        self.source_layer == layer || self.target_layer == layer
    }

    /// The layer on the far side of `layer`
    pub fn other_layer(&self, layer: LayerName) -> Option<LayerName> {
        if self.source_layer == layer {
            Some(self.target_layer)
        } else if self.target_layer == layer {
            Some(self.source_layer)
        } else {
            None
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn edge_type_parses_wire_tags() {
        assert_eq!(EdgeType::from_str("ALLIES_WITH").unwrap(), EdgeType::AlliesWith);
        assert_eq!(
            EdgeType::from_str("REDUCES_FAILURE_MODE").unwrap(),
            EdgeType::ReducesFailureMode
        );
        assert!(EdgeType::from_str("LIKES").is_err());
    }

    #[test]
    fn between_injects_table_defaults() {
        let edge = Edge::between(
            EdgeType::Opposes,
            NodeId::from("a"),
            NodeType::Member,
            NodeId::from("b"),
            NodeType::Member,
        );
        assert_eq!(edge.sign, Sign::Negative);
        assert_eq!(edge.direction, EdgeDirection::Undirected);
        assert_eq!(edge.layer, LayerName::Coalition);
        assert_eq!(edge.weight, 1.0);
        assert_eq!(edge.confidence, 1.0);
    }

    #[test]
    fn other_end_resolves_either_side() {
        let edge = Edge::between(
            EdgeType::Informs,
            NodeId::from("a"),
            NodeType::Staff,
            NodeId::from("b"),
            NodeType::Member,
        );
        assert_eq!(edge.other_end(&NodeId::from("a")), Some(&NodeId::from("b")));
        assert_eq!(edge.other_end(&NodeId::from("b")), Some(&NodeId::from("a")));
        assert_eq!(edge.other_end(&NodeId::from("c")), None);
    }

    #[test]
    fn coupling_id_ignores_layer_order() {
        let node = NodeId::from("committee:x");
        assert_eq!(
            coupling_id(&node, LayerName::Jurisdiction, LayerName::Coalition),
            coupling_id(&node, LayerName::Coalition, LayerName::Jurisdiction)
        );
        assert_ne!(
            coupling_id(&node, LayerName::Jurisdiction, LayerName::Coalition),
            coupling_id(&node, LayerName::Jurisdiction, LayerName::Procedural)
        );
    }

    #[test]
    fn coupling_strength_is_clamped() {
        let c = InterLayerEdge::new(
            NodeId::from("n"),
            LayerName::Coalition,
            LayerName::InformationFlow,
            3.0,
        );
        assert_eq!(c.coupling_strength, 1.0);
        assert_eq!(c.other_layer(LayerName::Coalition), Some(LayerName::InformationFlow));
        assert_eq!(c.other_layer(LayerName::Procedural), None);
    }

    #[test]
    fn edge_json_uses_type_key() {
        let edge = Edge::between(
            EdgeType::MemberOf,
            NodeId::from("m"),
            NodeType::Member,
            NodeId::from("c"),
            NodeType::Committee,
        )
        .with_id("e1");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "MEMBER_OF");
        assert_eq!(json["layer"], "JURISDICTION");
        assert_eq!(json["sign"], "positive");
        let back: Edge = serde_json::from_value(json).unwrap();
        assert_eq!(back, edge);
    }
}
