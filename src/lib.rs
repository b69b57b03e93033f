//! Multiplex: Signed-Graph Engine for Institutional Decision Networks
//!
//! An in-memory engine that models an institutional decision network as
//! seven typed layers sharing one set of node identities, and runs
//! signed-network analytics over it.
//!
//! # Core Concepts
//!
//! - **Layers**: Capability, IssueSurface, PolicyArea, Jurisdiction,
//!   Procedural, Coalition and InformationFlow, each admitting a fixed set
//!   of node and edge types
//! - **Nodes**: Typed entities; a node joins every layer its type allows
//! - **Edges**: Signed, weighted relations living in exactly one layer
//! - **Couplings**: Inter-layer edges joining one node identity across two
//!   of its layers
//!
//! # Example
//!
//! ```
//! use multiplex::graph::{create_edge, EdgeType, MultiplexNetwork, Node, NodeAttributes, NodeType};
//!
//! let mut network = MultiplexNetwork::new();
//! let a = Node::new("member:a", "A", NodeAttributes::empty(NodeType::Member));
//! let b = Node::new("member:b", "B", NodeAttributes::empty(NodeType::Member));
//! network.add_node_to_layers(a.clone()).unwrap();
//! network.add_node_to_layers(b.clone()).unwrap();
//! network.add_edge(create_edge(EdgeType::AlliesWith, &a, &b)).unwrap();
//! assert_eq!(network.calculate_versatility(&a.id), 3.0 / 7.0);
//! ```

pub mod analysis;
pub mod cancel;
pub mod config;
pub mod graph;
pub mod layers;
pub mod query;
pub mod storage;

pub use cancel::CancellationToken;
pub use config::EngineConfig;
pub use graph::{
    Edge, EdgeId, EdgeType, InterLayerEdge, Layer, LayerName, MultiplexError, MultiplexNetwork,
    MultiplexResult, Node, NodeId, NodeType, Session, Sign,
};
pub use query::{CrossLayerOptions, Direction, PathOptions, PathResult};
pub use storage::{NetworkSnapshot, OpenStore, SnapshotStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
