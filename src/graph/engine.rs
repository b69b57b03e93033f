//! Error taxonomy and the analytic session that owns a network

use super::layer::LayerName;
use super::network::MultiplexNetwork;
use super::node::{NodeId, NodeType};
use crate::config::EngineConfig;
use crate::storage::{NetworkSnapshot, SnapshotStore, StorageError};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::info;

/// Whether a rejected record was a node or an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Node,
    Edge,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Node => f.write_str("node"),
            RecordKind::Edge => f.write_str("edge"),
        }
    }
}

/// Errors that can occur in multiplex operations
///
/// The first four variants are the structural mutation failures: when one
/// is returned, nothing was written. Semantic rule violations are not
/// errors; they come back as a [`ValidationReport`](super::ValidationReport).
#[derive(Debug, Error)]
pub enum MultiplexError {
    #[error("{kind} {id} has type {type_name}, which layer {layer} does not allow")]
    TypeNotAllowed {
        kind: RecordKind,
        id: String,
        type_name: String,
        layer: LayerName,
    },

    #[error("edge {edge_id} declares layer {declared} but was inserted into {layer}")]
    LayerMismatch {
        edge_id: String,
        declared: LayerName,
        layer: LayerName,
    },

    #[error("node {node_id} is not present in layer {layer}")]
    NodeNotInLayer { node_id: NodeId, layer: LayerName },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Unknown type tag: {0}")]
    UnknownType(String),

    #[error("node {node_id} already exists as {existing}, refusing to rebind it as {requested}")]
    IdConflict {
        node_id: NodeId,
        existing: NodeType,
        requested: NodeType,
    },

    #[error("coupling for node {node_id} joins layer {layer} to itself")]
    SelfCoupling { node_id: NodeId, layer: LayerName },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for multiplex operations
pub type MultiplexResult<T> = Result<T, MultiplexError>;

/// One analytic session over a multiplex network
///
/// Writers take the whole network exclusively; readers share it. Loading
/// a snapshot builds the replacement network before taking the write lock,
/// so a failed load leaves the current state in place.
#[derive(Debug, Default)]
pub struct Session {
    network: RwLock<MultiplexNetwork>,
}

impl Session {
    /// Create a session with empty layers
    pub fn new(config: EngineConfig) -> Self {
        Self::from_network(MultiplexNetwork::with_config(config))
    }

    pub fn from_network(network: MultiplexNetwork) -> Self {
        Self {
            network: RwLock::new(network),
        }
    }

    /// Shared access for analytics and lookups
    pub fn read(&self) -> MultiplexResult<RwLockReadGuard<'_, MultiplexNetwork>> {
        self.network
            .read()
            .map_err(|e| MultiplexError::LockPoisoned(e.to_string()))
    }

    /// Exclusive access for mutation
    pub fn write(&self) -> MultiplexResult<RwLockWriteGuard<'_, MultiplexNetwork>> {
        self.network
            .write()
            .map_err(|e| MultiplexError::LockPoisoned(e.to_string()))
    }

    /// Replace the session's network with one rebuilt from `snapshot`
    pub fn load(&self, snapshot: &NetworkSnapshot) -> MultiplexResult<()> {
        let config = self.read()?.config().clone();
        let fresh = MultiplexNetwork::load(snapshot, config)?;
        let mut guard = self.write()?;
        *guard = fresh;
        info!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            couplings = snapshot.inter_layer_edges.len(),
            "session loaded"
        );
        Ok(())
    }

    pub fn snapshot(&self) -> MultiplexResult<NetworkSnapshot> {
        Ok(self.read()?.snapshot())
    }

    /// Write the current state to `store` under `name`
    pub fn persist(&self, store: &dyn SnapshotStore, name: &str) -> MultiplexResult<()> {
        let snapshot = self.snapshot()?;
        store.save_snapshot(name, &snapshot)?;
        info!(name, nodes = snapshot.nodes.len(), "session persisted");
        Ok(())
    }

    /// Load the snapshot stored under `name`; returns false if there is none
    pub fn restore(&self, store: &dyn SnapshotStore, name: &str) -> MultiplexResult<bool> {
        match store.load_snapshot(name)? {
            Some(snapshot) => {
                self.load(&snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
