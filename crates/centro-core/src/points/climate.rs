use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::info;

use centro_api::portal::ControlCommand;

use super::registry::{PointKind, STATUS_KEY};
use super::{PointReading, Reading, unique_id};
use crate::controller::Controller;
use crate::store::Snapshot;

/// Circuit enable flags, newer firmware first.
const CIRCUIT_KEYS: [&str; 2] = ["C1B_onOff", "K1B_onOff"];
const CURRENT_TEMPERATURE_KEY: &str = "B_Tk1";
const POWER_COMMAND: &str = "PWR 99";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HvacMode {
    Off,
    Heat,
}

impl HvacMode {
    /// Mode implied by a snapshot.
    ///
    /// Heating when circuit 1 is enabled or the boiler reports any state
    /// other than `OFF`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let circuit_on = CIRCUIT_KEYS
            .iter()
            .any(|key| snapshot.get_f64(key) == Some(1.0));
        let boiler_running = snapshot
            .get(STATUS_KEY)
            .is_some_and(|state| state.is_truthy() && state.as_str() != Some("OFF"));

        if circuit_on || boiler_running {
            Self::Heat
        } else {
            Self::Off
        }
    }
}

/// The boiler as a heating device.
pub struct Climate {
    unique_id: String,
    name: String,
    controller: Controller,
}

impl Climate {
    pub(crate) fn new(controller: &Controller) -> Self {
        let install_id = &controller.config().install_id;
        Self {
            unique_id: unique_id(install_id, "climate"),
            name: format!("Boiler {install_id}"),
            controller: controller.clone(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hvac_mode(&self) -> HvacMode {
        HvacMode::from_snapshot(&self.controller.store().snapshot())
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.controller.store().snapshot().get_f64(CURRENT_TEMPERATURE_KEY)
    }

    /// Switch the boiler on or off, then refresh whatever the outcome.
    pub async fn set_hvac_mode(&self, mode: HvacMode) -> bool {
        info!(%mode, "setting boiler mode");
        let value = match mode {
            HvacMode::Heat => 1.0,
            HvacMode::Off => 0.0,
        };
        let accepted = self
            .controller
            .send_command(&ControlCommand::set(POWER_COMMAND, value))
            .await;
        self.controller.request_refresh().await;
        accepted
    }

    pub async fn turn_on(&self) -> bool {
        self.set_hvac_mode(HvacMode::Heat).await
    }

    pub async fn turn_off(&self) -> bool {
        self.set_hvac_mode(HvacMode::Off).await
    }

    pub(crate) fn reading(&self) -> PointReading {
        let mut attributes = BTreeMap::new();
        if let Some(t) = self.current_temperature() {
            attributes.insert("current_temperature".to_owned(), t.into());
        }
        PointReading {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            kind: PointKind::Climate,
            key: POWER_COMMAND.into(),
            value: Reading::Text(self.hvac_mode().to_string()),
            unit: None,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use centro_api::{FieldValue, ParamMap};

    use super::*;
    use crate::store::SnapshotSource;

    fn snapshot(entries: &[(&str, FieldValue)]) -> Snapshot {
        let params: ParamMap = entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect();
        Snapshot {
            params,
            source: SnapshotSource::Telemetry,
            published_at: None,
        }
    }

    #[test]
    fn empty_snapshot_is_off() {
        assert_eq!(HvacMode::from_snapshot(&Snapshot::default()), HvacMode::Off);
    }

    #[test]
    fn circuit_flag_means_heat() {
        let snap = snapshot(&[("K1B_onOff", FieldValue::Number(1.0))]);
        assert_eq!(HvacMode::from_snapshot(&snap), HvacMode::Heat);
    }

    #[test]
    fn boiler_state_other_than_off_means_heat() {
        let snap = snapshot(&[("B_STATE", "S7-1".into()), ("C1B_onOff", FieldValue::Number(0.0))]);
        assert_eq!(HvacMode::from_snapshot(&snap), HvacMode::Heat);

        let snap = snapshot(&[("B_STATE", "OFF".into())]);
        assert_eq!(HvacMode::from_snapshot(&snap), HvacMode::Off);

        let snap = snapshot(&[("B_STATE", "".into())]);
        assert_eq!(HvacMode::from_snapshot(&snap), HvacMode::Off);
    }

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!("heat".parse::<HvacMode>().ok(), Some(HvacMode::Heat));
        assert_eq!("OFF".parse::<HvacMode>().ok(), Some(HvacMode::Off));
        assert_eq!(HvacMode::Heat.to_string(), "heat");
    }
}
