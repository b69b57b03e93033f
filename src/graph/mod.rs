//! Core graph data structures

mod edge;
mod engine;
mod layer;
mod network;
mod node;
mod validity;

pub use edge::{coupling_id, Edge, EdgeDirection, EdgeId, EdgeType, InterLayerEdge, Sign};
pub use engine::{MultiplexError, MultiplexResult, RecordKind, Session};
pub use layer::{
    Layer, LayerMetrics, LayerName, LayerPolicy, SignBalance, ValidationIssue, ValidationReport,
    DEFAULT_MAX_PATHS,
};
pub use network::{MultiplexMetrics, MultiplexNetwork, NetworkValidation};
pub use node::{Metadata, Node, NodeAttributes, NodeGroup, NodeId, NodeType, Provenance};
pub use validity::{
    create_edge, create_node, edge_types_for_layer, validate_edge, EdgeRule, EdgeViolation,
};
