use std::collections::BTreeMap;

use tracing::{error, info};

use centro_api::portal::ControlCommand;

use super::registry::{PointKind, SwitchDescriptor};
use super::{PointReading, Reading, unique_id};
use crate::controller::Controller;

/// On/off control backed by a `PWR` parameter.
pub struct Switch {
    descriptor: &'static SwitchDescriptor,
    unique_id: String,
    controller: Controller,
}

impl Switch {
    pub(crate) fn new(descriptor: &'static SwitchDescriptor, controller: &Controller) -> Self {
        Self {
            descriptor,
            unique_id: unique_id(&controller.config().install_id, descriptor.id),
            controller: controller.clone(),
        }
    }

    pub fn descriptor(&self) -> &'static SwitchDescriptor {
        self.descriptor
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// `None` when the state key is absent; non-numeric state reads as off.
    pub fn is_on(&self) -> Option<bool> {
        let value = self.controller.store().get(self.descriptor.state_key)?;
        Some(value.as_f64().is_some_and(|n| n.trunc() == 1.0))
    }

    pub async fn turn_on(&self) -> bool {
        self.set(true).await
    }

    pub async fn turn_off(&self) -> bool {
        self.set(false).await
    }

    /// Send the on/off command; refresh on success.
    pub async fn set(&self, on: bool) -> bool {
        let d = self.descriptor;
        let label = if on { "ON" } else { "OFF" };
        info!(point = d.id, command = d.command, "turning {label} {}", d.name);

        let command = ControlCommand::set(d.command, if on { 1.0 } else { 0.0 });
        if self.controller.send_command(&command).await {
            info!(point = d.id, "{label} command accepted");
            self.controller.request_refresh().await;
            true
        } else {
            error!(point = d.id, "failed to send {label} command for {}", d.name);
            false
        }
    }

    pub(crate) fn reading(&self) -> PointReading {
        let value = match self.is_on() {
            Some(true) => Reading::Text("ON".into()),
            Some(false) => Reading::Text("OFF".into()),
            None => Reading::Unknown,
        };
        PointReading {
            unique_id: self.unique_id.clone(),
            name: self.descriptor.name.into(),
            kind: PointKind::Switch,
            key: self.descriptor.state_key.into(),
            value,
            unit: None,
            attributes: BTreeMap::new(),
        }
    }
}
