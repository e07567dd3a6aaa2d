//! Telemetry Snapshot Store
//!
//! Keyed last-write-wins map of the latest snapshot per scale, with a
//! broadcast change feed so multiple consumers can observe updates
//! without polling. Out-of-order or duplicate messages simply overwrite
//! with whatever arrived last; there is no timestamp reconciliation.

use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

use super::messages::ScaleSnapshot;

/// Observable map of the latest snapshot per scale
pub struct SnapshotStore {
    inner: RwLock<HashMap<i64, ScaleSnapshot>>,
    changes: broadcast::Sender<ScaleSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            inner: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Store a snapshot, replacing any prior one for the same scale,
    /// and notify watchers.
    pub fn apply(&self, snapshot: ScaleSnapshot) {
        self.inner
            .write()
            .unwrap()
            .insert(snapshot.scale_id, snapshot.clone());
        // No receivers is fine; updates are not buffered for later
        let _ = self.changes.send(snapshot);
    }

    /// Latest snapshot for a scale, if any message has arrived for it
    pub fn get(&self, scale_id: i64) -> Option<ScaleSnapshot> {
        self.inner.read().unwrap().get(&scale_id).cloned()
    }

    /// All current snapshots
    pub fn all(&self) -> Vec<ScaleSnapshot> {
        self.inner.read().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Drop every snapshot. Only called on full application reset.
    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    /// Subscribe to snapshot updates
    pub fn watch(&self) -> broadcast::Receiver<ScaleSnapshot> {
        self.changes.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
