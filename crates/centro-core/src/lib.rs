// centro-core: merged boiler state between centro-api and consumers (CLI).

pub mod config;
pub mod controller;
pub mod error;
pub mod points;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use points::{
    Climate, FieldDescriptor, HvacMode, NumberControl, PointKind, PointSet, Reading, Sensor,
    StatusSensor, Switch, Transform,
};
pub use store::{DataStore, Snapshot, SnapshotSource};
pub use stream::SnapshotStream;

// Value types flow straight through from the transport layer.
pub use centro_api::{FieldValue, ParamMap};
