// ── Reactive snapshot stream ──
//
// Subscription type for consuming merged-state changes from the DataStore.

use std::sync::Arc;

use tokio::sync::watch;

use crate::store::Snapshot;

/// A subscription to the published snapshot.
///
/// Provides point-in-time access and change notification via
/// [`changed()`](Self::changed).
pub struct SnapshotStream {
    current: Arc<Snapshot>,
    receiver: watch::Receiver<Arc<Snapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Snapshot>>) -> Self {
        let current = Arc::clone(&receiver.borrow());
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<Snapshot> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Wait for the next publication, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = Arc::clone(&self.receiver.borrow_and_update());
        self.current = Arc::clone(&snap);
        Some(snap)
    }
}
