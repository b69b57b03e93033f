//! Signed-network analytics over a multiplex network
//!
//! Everything here is a read-only function of a [`Layer`](crate::graph::Layer)
//! or a [`MultiplexNetwork`](crate::graph::MultiplexNetwork), so analytics can
//! run side by side under a shared [`Session::read`](crate::graph::Session::read)
//! guard.
//!
//! - [`balance`]: triangle frustration and minimum sign-flip partitions
//! - [`centrality`]: per-layer degree, betweenness, closeness, eigenvector
//!   and PageRank, plus multiplex centrality variants
//! - [`community`]: label-propagation communities
//! - [`pagerank`]: random walks over (node, layer) states
//! - [`institutional`]: dominance, latency, lock-in, optionality, risk,
//!   meta-stability and information asymmetry
//!
//! # Example
//!
//! ```ignore
//! use multiplex::analysis::{structural_balance, InstitutionalMetrics};
//! use multiplex::graph::LayerName;
//!
//! let network = session.read()?;
//! let balance = structural_balance(network.layer(LayerName::Coalition));
//! let stability = InstitutionalMetrics::new(&network).meta_stability();
//! ```

pub mod aggregate;
pub mod balance;
pub mod centrality;
pub mod community;
pub mod institutional;
pub mod pagerank;

pub use aggregate::AggregateGraph;
pub use balance::{
    analyze_triangles, frustration_index, min_flip_frustration, structural_balance, FlipPartition,
    StructuralBalance, TriangleAnalysis, EXACT_NODE_LIMIT,
};
pub use centrality::{
    betweenness_centrality, closeness_centrality, degree_centrality, eigenvector_centrality,
    layer_centralities, layer_correlation, layer_pagerank, multiplex_centrality,
    node_multiplex_centrality, node_report, participation_coefficient, versatile_nodes,
    CentralityMethod, LayerCentralities, LayerCorrelation, NodeCentralityReport,
};
pub use community::{label_propagation, layer_communities, Communities};
pub use institutional::{
    gini, percentile, AsymmetryPair, Cascade, ConstraintDominance, DominancePolicy,
    EndogenousRisk, InformationAsymmetry, InstitutionalMetrics, LatentAnalysis, LatentSubgraph,
    MetaStability, PathCoverage, PathDependence, ReachMass, DEFAULT_MAX_CYCLES,
};
pub use pagerank::{multiplex_pagerank, PageRankResult};
