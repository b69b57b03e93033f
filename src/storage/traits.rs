//! Storage trait definitions

use crate::graph::{Edge, InterLayerEdge, Node};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Everything needed to rebuild a network
///
/// Nodes appear once even when they live in several layers; the layers a
/// node joins follow from its type when the snapshot is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub inter_layer_edges: Vec<InterLayerEdge>,
    pub taken_at: DateTime<Utc>,
}

impl NetworkSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.inter_layer_edges.is_empty()
    }
}

/// Named snapshot storage
///
/// Implementations must be thread-safe (Send + Sync) so one store can back
/// several sessions.
pub trait SnapshotStore: Send + Sync {
    /// Save `snapshot` under `name`, replacing any previous one
    fn save_snapshot(&self, name: &str, snapshot: &NetworkSnapshot) -> StorageResult<()>;

    fn load_snapshot(&self, name: &str) -> StorageResult<Option<NetworkSnapshot>>;

    /// Names of all stored snapshots, sorted
    fn list_snapshots(&self) -> StorageResult<Vec<String>>;

    /// Returns false if there was nothing to delete
    fn delete_snapshot(&self, name: &str) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: SnapshotStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
