// ── Snapshot store ──
//
// Lock-free merged boiler state with push-based change notification.

mod data_store;
mod snapshot;

pub use data_store::DataStore;
pub use snapshot::{Snapshot, SnapshotSource, merge_refresh, merge_telemetry};
