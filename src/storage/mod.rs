//! Persistence boundary for multiplex networks
//!
//! A network crosses this boundary as a [`NetworkSnapshot`]. Stores keep
//! snapshots by name through the `SnapshotStore` trait; `SqliteStore` is the
//! bundled implementation.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{NetworkSnapshot, OpenStore, SnapshotStore, StorageError, StorageResult};
