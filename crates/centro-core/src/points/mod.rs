// ── Points ──
//
// Typed read/write views over the merged snapshot. A point holds no value
// of its own: every read dereferences the snapshot the store last
// published, and every write goes through the controller's portal client.

mod climate;
mod number;
pub mod registry;
mod sensor;
mod status;
mod switch;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use centro_api::FieldValue;

use crate::controller::Controller;

pub use climate::{Climate, HvacMode};
pub use number::NumberControl;
pub use registry::{
    DeviceClass, FieldDescriptor, NumberDescriptor, PointKind, StateClass, SwitchDescriptor,
    Transform,
};
pub use sensor::Sensor;
pub use status::StatusSensor;
pub use switch::Switch;

/// Prefix of every point's unique id.
pub const UNIQUE_ID_PREFIX: &str = "centro";

/// `centro_{install_id}_{point_id}`.
pub fn unique_id(install_id: &str, point_id: &str) -> String {
    format!("{UNIQUE_ID_PREFIX}_{install_id}_{point_id}")
}

// ── Reading ──────────────────────────────────────────────────────────

/// Displayable value of a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Unknown,
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Unknown | Self::Text(_) => None,
        }
    }
}

impl From<&FieldValue> for Reading {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Number(n) => Self::Number(*n),
            FieldValue::Text(s) => Self::Text(s.clone()),
        }
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unknown, Self::Number)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── PointReading ─────────────────────────────────────────────────────

/// One row of a point listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReading {
    pub unique_id: String,
    pub name: String,
    pub kind: PointKind,
    pub key: String,
    pub value: Reading,
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, FieldValue>,
}

// ── PointSet ─────────────────────────────────────────────────────────

/// Every point of one installation, bound to a controller.
pub struct PointSet {
    pub sensors: Vec<Sensor>,
    pub status: StatusSensor,
    pub numbers: Vec<NumberControl>,
    pub switches: Vec<Switch>,
    pub climate: Climate,
}

impl PointSet {
    pub(crate) fn new(controller: &Controller) -> Self {
        Self {
            sensors: registry::sensors()
                .map(|d| Sensor::new(d, controller))
                .collect(),
            status: StatusSensor::new(controller),
            numbers: registry::NUMBER_CONTROLS
                .iter()
                .map(|d| NumberControl::new(d, controller))
                .collect(),
            switches: registry::SWITCHES
                .iter()
                .map(|d| Switch::new(d, controller))
                .collect(),
            climate: Climate::new(controller),
        }
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        self.sensors.len() + self.numbers.len() + self.switches.len() + 2
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn sensor(&self, id_or_key: &str) -> Option<&Sensor> {
        let descriptor = registry::sensor(id_or_key)?;
        self.sensors.iter().find(|s| s.descriptor().id == descriptor.id)
    }

    pub fn number(&self, name: &str) -> Option<&NumberControl> {
        let descriptor = registry::number(name)?;
        self.numbers.iter().find(|n| n.descriptor().id == descriptor.id)
    }

    pub fn switch(&self, name: &str) -> Option<&Switch> {
        let descriptor = registry::switch(name)?;
        self.switches.iter().find(|s| s.descriptor().id == descriptor.id)
    }

    /// Read every point against the current snapshot.
    pub fn readings(&self) -> Vec<PointReading> {
        let mut rows = Vec::with_capacity(self.len());
        rows.push(self.status.reading());
        rows.push(self.climate.reading());
        rows.extend(self.sensors.iter().map(Sensor::reading));
        rows.extend(self.numbers.iter().map(NumberControl::reading));
        rows.extend(self.switches.iter().map(Switch::reading));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_are_scoped_by_installation() {
        assert_eq!(unique_id("1844", "boiler_temperature"), "centro_1844_boiler_temperature");
    }

    #[test]
    fn readings_display() {
        assert_eq!(Reading::Unknown.to_string(), "unknown");
        assert_eq!(Reading::Number(62.5).to_string(), "62.5");
        assert_eq!(Reading::Text("ON".into()).to_string(), "ON");
        assert_eq!(Reading::from(None::<f64>), Reading::Unknown);
    }

    #[test]
    fn unknown_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Reading::Unknown).ok().as_deref(), Some("null"));
        assert_eq!(serde_json::to_string(&Reading::Number(80.0)).ok().as_deref(), Some("80.0"));
    }
}
