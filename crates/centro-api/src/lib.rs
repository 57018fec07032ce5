// centro-api: Async clients for the Centrometal web portal (HTTP) and the
// biotec telemetry broker (MQTT).

pub mod error;
pub mod portal;
pub mod telemetry;
pub mod transport;
pub mod value;

pub use error::Error;
pub use portal::{PortalClient, STATUS_PARAM_PREFIX};
pub use telemetry::{BrokerConfig, TelemetryHandle, TelemetryUpdate, topic_for};
pub use transport::{TlsMode, TransportConfig};
pub use value::{FieldValue, ParamMap};
