//! SQLite snapshot store

use super::traits::{NetworkSnapshot, OpenStore, SnapshotStore, StorageError, StorageResult};
use crate::graph::{Edge, InterLayerEdge, Node};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed snapshot store
///
/// One row per snapshot in `snapshots`, with its records in `snapshot_nodes`,
/// `snapshot_edges` and `snapshot_couplings`. Each record is stored as its
/// JSON form alongside a few plain columns for inspection. Thread-safe via
/// an internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                name TEXT PRIMARY KEY,
                taken_at TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshot_nodes (
                snapshot TEXT NOT NULL,
                id TEXT NOT NULL,
                node_type TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (snapshot, id),
                FOREIGN KEY (snapshot) REFERENCES snapshots(name) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS snapshot_edges (
                snapshot TEXT NOT NULL,
                id TEXT NOT NULL,
                layer TEXT NOT NULL,
                edge_type TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (snapshot, id),
                FOREIGN KEY (snapshot) REFERENCES snapshots(name) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS snapshot_couplings (
                snapshot TEXT NOT NULL,
                id TEXT NOT NULL,
                node_id TEXT NOT NULL,
                source_layer TEXT NOT NULL,
                target_layer TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (snapshot, id),
                FOREIGN KEY (snapshot) REFERENCES snapshots(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_snapshot_edges_layer
                ON snapshot_edges(snapshot, layer);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    fn parse_time(text: &str) -> StorageResult<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(text)
            .map_err(|e| StorageError::DateParse(e.to_string()))?
            .with_timezone(&Utc))
    }

    /// Decode every payload of `table` belonging to `name`, ordered by id
    fn load_payloads<T: DeserializeOwned>(
        conn: &Connection,
        table: &str,
        name: &str,
    ) -> StorageResult<Vec<T>> {
        let sql = format!(
            "SELECT payload_json FROM {} WHERE snapshot = ?1 ORDER BY id",
            table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![name], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(serde_json::from_str(&row?)?);
        }
        Ok(out)
    }

    fn open_with(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_with(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::open_with(Connection::open_in_memory()?)
    }
}

impl SnapshotStore for SqliteStore {
    fn save_snapshot(&self, name: &str, snapshot: &NetworkSnapshot) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // replacing cascades to the old records
        tx.execute("DELETE FROM snapshots WHERE name = ?1", params![name])?;
        tx.execute(
            "INSERT INTO snapshots (name, taken_at, saved_at) VALUES (?1, ?2, ?3)",
            params![name, snapshot.taken_at.to_rfc3339(), Utc::now().to_rfc3339()],
        )?;

        {
            let mut insert_node = tx.prepare(
                "INSERT INTO snapshot_nodes (snapshot, id, node_type, payload_json)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for node in &snapshot.nodes {
                insert_node.execute(params![
                    name,
                    node.id.as_str(),
                    node.node_type().as_str(),
                    serde_json::to_string(node)?,
                ])?;
            }

            let mut insert_edge = tx.prepare(
                "INSERT INTO snapshot_edges
                    (snapshot, id, layer, edge_type, source_id, target_id, payload_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for edge in &snapshot.edges {
                insert_edge.execute(params![
                    name,
                    edge.id.as_str(),
                    edge.layer.as_str(),
                    edge.edge_type.as_str(),
                    edge.source_id.as_str(),
                    edge.target_id.as_str(),
                    serde_json::to_string(edge)?,
                ])?;
            }

            let mut insert_coupling = tx.prepare(
                "INSERT INTO snapshot_couplings
                    (snapshot, id, node_id, source_layer, target_layer, payload_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for coupling in &snapshot.inter_layer_edges {
                insert_coupling.execute(params![
                    name,
                    coupling.id,
                    coupling.node_id.as_str(),
                    coupling.source_layer.as_str(),
                    coupling.target_layer.as_str(),
                    serde_json::to_string(coupling)?,
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            name,
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "snapshot saved"
        );
        Ok(())
    }

    fn load_snapshot(&self, name: &str) -> StorageResult<Option<NetworkSnapshot>> {
        let conn = self.lock()?;
        let taken_at: Option<String> = conn
            .query_row(
                "SELECT taken_at FROM snapshots WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(taken_at) = taken_at else {
            return Ok(None);
        };

        let nodes: Vec<Node> = Self::load_payloads(&conn, "snapshot_nodes", name)?;
        let edges: Vec<Edge> = Self::load_payloads(&conn, "snapshot_edges", name)?;
        let inter_layer_edges: Vec<InterLayerEdge> =
            Self::load_payloads(&conn, "snapshot_couplings", name)?;

        Ok(Some(NetworkSnapshot {
            nodes,
            edges,
            inter_layer_edges,
            taken_at: Self::parse_time(&taken_at)?,
        }))
    }

    fn list_snapshots(&self) -> StorageResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM snapshots ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn delete_snapshot(&self, name: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM snapshots WHERE name = ?1", params![name])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{create_edge, EdgeType, LayerName, NodeAttributes, NodeId, NodeType};

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_snapshot() -> NetworkSnapshot {
        let a = Node::new("member:a", "A", NodeAttributes::empty(NodeType::Member));
        let b = Node::new("member:b", "B", NodeAttributes::empty(NodeType::Member));
        let edge = create_edge(EdgeType::AlliesWith, &a, &b).with_id("e1");
        let coupling = InterLayerEdge::new(
            NodeId::from("member:a"),
            LayerName::Coalition,
            LayerName::Jurisdiction,
            0.5,
        );
        NetworkSnapshot {
            nodes: vec![a, b],
            edges: vec![edge],
            inter_layer_edges: vec![coupling],
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_load_snapshot() {
        let store = create_test_store();
        let snapshot = create_test_snapshot();
        store.save_snapshot("baseline", &snapshot).unwrap();

        let loaded = store.load_snapshot("baseline").unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let store = create_test_store();
        assert!(store.load_snapshot("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_records() {
        let store = create_test_store();
        let mut snapshot = create_test_snapshot();
        store.save_snapshot("s", &snapshot).unwrap();

        snapshot.edges.clear();
        snapshot.nodes.truncate(1);
        store.save_snapshot("s", &snapshot).unwrap();

        let loaded = store.load_snapshot("s").unwrap().unwrap();
        assert_eq!(loaded.nodes.len(), 1);
        assert!(loaded.edges.is_empty());
    }

    #[test]
    fn test_list_and_delete_snapshots() {
        let store = create_test_store();
        let snapshot = create_test_snapshot();
        store.save_snapshot("b", &snapshot).unwrap();
        store.save_snapshot("a", &snapshot).unwrap();
        assert_eq!(store.list_snapshots().unwrap(), vec!["a", "b"]);

        assert!(store.delete_snapshot("a").unwrap());
        assert!(!store.delete_snapshot("a").unwrap());
        assert_eq!(store.list_snapshots().unwrap(), vec!["b"]);

        let orphans: i64 = store
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM snapshot_nodes WHERE snapshot = 'a'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_wal_mode_enabled_at_connection() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested/test-wal.db")).unwrap();

        let journal_mode: String = store
            .lock()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode, "wal");
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let snapshot = create_test_snapshot();
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_snapshot("kept", &snapshot).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_snapshot("kept").unwrap(), Some(snapshot));
    }
}
