use std::collections::BTreeMap;
use std::sync::Arc;

use super::registry::FieldDescriptor;
use super::{PointReading, Reading, unique_id};
use crate::controller::Controller;
use crate::store::DataStore;

/// Read-only point bound to one field key.
pub struct Sensor {
    descriptor: &'static FieldDescriptor,
    unique_id: String,
    store: Arc<DataStore>,
}

impl Sensor {
    pub(crate) fn new(descriptor: &'static FieldDescriptor, controller: &Controller) -> Self {
        Self::with_store(descriptor, &controller.config().install_id, Arc::clone(controller.store()))
    }

    pub(crate) fn with_store(
        descriptor: &'static FieldDescriptor,
        install_id: &str,
        store: Arc<DataStore>,
    ) -> Self {
        Self {
            descriptor,
            unique_id: unique_id(install_id, descriptor.id),
            store,
        }
    }

    pub fn descriptor(&self) -> &'static FieldDescriptor {
        self.descriptor
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Current value with the descriptor's transform applied.
    pub fn read(&self) -> Reading {
        let snapshot = self.store.snapshot();
        self.descriptor.transform.apply(snapshot.get(self.descriptor.key))
    }

    pub(crate) fn reading(&self) -> PointReading {
        PointReading {
            unique_id: self.unique_id.clone(),
            name: self.descriptor.name.into(),
            kind: self.descriptor.kind,
            key: self.descriptor.key.into(),
            value: self.read(),
            unit: self.descriptor.unit.map(Into::into),
            attributes: BTreeMap::new(),
        }
    }
}
