use std::collections::BTreeMap;
use std::sync::Arc;

use centro_api::FieldValue;

use super::registry::{PointKind, STATUS_ATTRIBUTES, STATUS_KEY};
use super::{PointReading, Reading, unique_id};
use crate::controller::Controller;
use crate::store::DataStore;

const STATUS_UNKNOWN: &str = "Unknown";

/// Overall boiler state plus descriptive attributes.
pub struct StatusSensor {
    unique_id: String,
    store: Arc<DataStore>,
}

impl StatusSensor {
    pub const NAME: &'static str = "Boiler Status";
    pub const ICON: &'static str = "mdi:information";

    pub(crate) fn new(controller: &Controller) -> Self {
        Self::with_store(&controller.config().install_id, Arc::clone(controller.store()))
    }

    pub(crate) fn with_store(install_id: &str, store: Arc<DataStore>) -> Self {
        Self {
            unique_id: unique_id(install_id, "status"),
            store,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// `B_STATE`, or `"Unknown"` when the boiler has not reported it.
    pub fn value(&self) -> String {
        self.store
            .get(STATUS_KEY)
            .map_or_else(|| STATUS_UNKNOWN.to_owned(), |v| v.to_string())
    }

    /// Attributes whose keys are present in the snapshot.
    pub fn attributes(&self) -> BTreeMap<String, FieldValue> {
        let snapshot = self.store.snapshot();
        STATUS_ATTRIBUTES
            .iter()
            .filter_map(|(name, key)| snapshot.get(key).map(|v| ((*name).to_owned(), v.clone())))
            .collect()
    }

    pub(crate) fn reading(&self) -> PointReading {
        PointReading {
            unique_id: self.unique_id.clone(),
            name: Self::NAME.into(),
            kind: PointKind::Status,
            key: STATUS_KEY.into(),
            value: Reading::Text(self.value()),
            unit: None,
            attributes: self.attributes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use centro_api::ParamMap;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_to_unknown() {
        let status = StatusSensor::with_store("1844", Arc::new(DataStore::new()));
        assert_eq!(status.value(), "Unknown");
        assert!(status.attributes().is_empty());
        assert_eq!(status.unique_id(), "centro_1844_status");
    }

    #[test]
    fn attributes_skip_missing_keys() {
        let store = Arc::new(DataStore::new());
        let mut frame = ParamMap::new();
        frame.insert("B_STATE".into(), "S7-1".into());
        frame.insert("B_PRODNAME".into(), "BioTec-L".into());
        frame.insert("B_VER".into(), FieldValue::Number(3.4));
        store.apply_telemetry(&frame);

        let status = StatusSensor::with_store("1844", store);

        assert_eq!(status.value(), "S7-1");
        let attrs = status.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["product_name"], FieldValue::from("BioTec-L"));
        assert_eq!(attrs["firmware_version"], FieldValue::Number(3.4));
    }
}
