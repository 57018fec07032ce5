use std::collections::BTreeMap;

use tracing::{error, info, warn};

use centro_api::portal::ControlCommand;

use super::registry::{NumberDescriptor, PointKind};
use super::{PointReading, Reading, unique_id};
use crate::controller::Controller;
use crate::error::CoreError;

/// Writable setpoint.
///
/// The displayed value always comes from the snapshot's state key, so a
/// write that fails leaves the last known value in place.
pub struct NumberControl {
    descriptor: &'static NumberDescriptor,
    unique_id: String,
    controller: Controller,
}

impl NumberControl {
    pub(crate) fn new(descriptor: &'static NumberDescriptor, controller: &Controller) -> Self {
        Self {
            descriptor,
            unique_id: unique_id(&controller.config().install_id, descriptor.id),
            controller: controller.clone(),
        }
    }

    pub fn descriptor(&self) -> &'static NumberDescriptor {
        self.descriptor
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Current setpoint, if reported and numeric.
    pub fn value(&self) -> Option<f64> {
        self.controller.store().snapshot().get_f64(self.descriptor.state_key)
    }

    /// Check `value` against the allowed range.
    pub fn validate(&self, value: f64) -> Result<(), CoreError> {
        if self.descriptor.contains(value) {
            Ok(())
        } else {
            Err(CoreError::OutOfRange {
                point: self.descriptor.id.into(),
                value,
                min: self.descriptor.min,
                max: self.descriptor.max,
            })
        }
    }

    /// Send a new setpoint. Returns whether the portal accepted it.
    ///
    /// On success an out-of-band refresh runs before this returns.
    pub async fn write(&self, value: f64) -> bool {
        if let Err(e) = self.validate(value) {
            warn!(error = %e, "setpoint not sent");
            return false;
        }

        let d = self.descriptor;
        info!(point = d.id, command = d.command, value, "setting {}", d.name);

        let command = ControlCommand::set(d.command, value);
        if self.controller.send_command(&command).await {
            info!(point = d.id, value, "setpoint accepted");
            self.controller.request_refresh().await;
            true
        } else {
            error!(point = d.id, value, "failed to send setpoint for {}", d.name);
            false
        }
    }

    pub(crate) fn reading(&self) -> PointReading {
        PointReading {
            unique_id: self.unique_id.clone(),
            name: self.descriptor.name.into(),
            kind: PointKind::Number,
            key: self.descriptor.state_key.into(),
            value: Reading::from(self.value()),
            unit: Some(self.descriptor.unit.into()),
            attributes: BTreeMap::new(),
        }
    }
}
