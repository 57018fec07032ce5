// ── Central snapshot store ──
//
// One `ArcSwap<Snapshot>` holds the published state. Readers load it
// wait-free; writers build a new map and swap the pointer. Every
// publication is mirrored into a `watch` channel for subscribers.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use centro_api::{FieldValue, ParamMap};

use super::snapshot::{Snapshot, SnapshotSource, merge_refresh, merge_telemetry};
use crate::stream::SnapshotStream;

/// Reactive store for the merged boiler state.
pub struct DataStore {
    current: ArcSwap<Snapshot>,
    notify: watch::Sender<Arc<Snapshot>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    last_telemetry: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let initial = Arc::new(Snapshot::default());
        let (notify, _) = watch::channel(Arc::clone(&initial));
        let (last_refresh, _) = watch::channel(None);
        let (last_telemetry, _) = watch::channel(None);

        Self {
            current: ArcSwap::new(initial),
            notify,
            last_refresh,
            last_telemetry,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.current.load().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    // ── Merges ───────────────────────────────────────────────────────

    /// Overlay one telemetry frame on the published snapshot.
    pub fn apply_telemetry(&self, delta: &ParamMap) -> Arc<Snapshot> {
        let snap = self.publish(|prev| {
            Snapshot::published(merge_telemetry(&prev.params, delta), SnapshotSource::Telemetry)
        });
        self.last_telemetry.send_replace(snap.published_at);
        snap
    }

    /// Fold a full refresh into the published snapshot.
    ///
    /// `pulled` is `None` when the portal pull failed.
    pub fn apply_refresh(&self, live: &ParamMap, pulled: Option<&ParamMap>) -> Arc<Snapshot> {
        let source = if pulled.is_some() {
            SnapshotSource::Pulled
        } else {
            SnapshotSource::Degraded
        };
        let snap = self.publish(|prev| {
            Snapshot::published(merge_refresh(&prev.params, live, pulled), source)
        });
        self.last_refresh.send_replace(snap.published_at);
        snap
    }

    /// Swap in a snapshot derived from the current one and notify.
    ///
    /// `rcu` retries the build if another writer swapped in between, so
    /// concurrent telemetry and refresh merges never lose keys.
    fn publish<F>(&self, mut build: F) -> Arc<Snapshot>
    where
        F: FnMut(&Snapshot) -> Snapshot,
    {
        let mut next = None;
        self.current.rcu(|prev| {
            let snap = Arc::new(build(prev));
            next = Some(Arc::clone(&snap));
            snap
        });
        let next = next.unwrap_or_else(|| self.current.load_full());
        self.notify.send_replace(Arc::clone(&next));
        next
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.notify.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn last_telemetry(&self) -> Option<DateTime<Utc>> {
        *self.last_telemetry.borrow()
    }

    /// How long ago the last full refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(entries: &[(&str, f64)]) -> ParamMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), FieldValue::Number(*v)))
            .collect()
    }

    #[test]
    fn starts_empty() {
        let store = DataStore::new();
        assert!(store.is_empty());
        assert_eq!(store.snapshot().source, SnapshotSource::Empty);
        assert!(store.last_refresh().is_none());
        assert!(store.data_age().is_none());
    }

    #[test]
    fn telemetry_is_published_immediately() {
        let store = DataStore::new();

        store.apply_telemetry(&frame(&[("B_Tk1", 62.5)]));

        assert_eq!(store.get("B_Tk1"), Some(FieldValue::Number(62.5)));
        assert_eq!(store.snapshot().source, SnapshotSource::Telemetry);
        assert!(store.last_telemetry().is_some());
        assert!(store.last_refresh().is_none());
    }

    #[test]
    fn refresh_records_pull_outcome() {
        let store = DataStore::new();
        store.apply_telemetry(&frame(&[("Y", 5.0)]));

        let snap = store.apply_refresh(&ParamMap::new(), None);

        assert_eq!(snap.source, SnapshotSource::Degraded);
        assert_eq!(snap.get_f64("Y"), Some(5.0));
        assert!(store.last_refresh().is_some());

        let snap = store.apply_refresh(&frame(&[("X", 1.0)]), Some(&frame(&[("X", 2.0)])));
        assert_eq!(snap.source, SnapshotSource::Pulled);
        assert_eq!(snap.get_f64("X"), Some(2.0));
        assert_eq!(snap.get_f64("Y"), Some(5.0));
    }

    #[test]
    fn old_snapshots_stay_intact() {
        let store = DataStore::new();
        store.apply_telemetry(&frame(&[("B_Tk1", 60.0)]));
        let before = store.snapshot();

        store.apply_telemetry(&frame(&[("B_Tk1", 70.0)]));

        assert_eq!(before.get_f64("B_Tk1"), Some(60.0));
        assert_eq!(store.snapshot().get_f64("B_Tk1"), Some(70.0));
    }

    #[tokio::test]
    async fn subscribers_see_each_publication() {
        let store = DataStore::new();
        let mut stream = store.subscribe();
        assert!(stream.current().is_empty());

        store.apply_telemetry(&frame(&[("B_Tk1", 61.0)]));

        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.get_f64("B_Tk1"), Some(61.0));
        assert_eq!(stream.latest().get_f64("B_Tk1"), Some(61.0));
    }
}
