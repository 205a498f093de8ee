use crate::context::CallContext;
use crate::error::{CatalogError, Result};
use crate::models::matches_filter;
use crate::proto::catalog::v1::{Device, Filter};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Storage for device records
///
/// Records go in and come out by value, so callers never share an instance
/// with the store.
pub trait DeviceStore: Send + Sync {
    /// Store a device, assigning a fresh UUID when `device.id` is empty
    ///
    /// ## Errors
    ///
    /// - `Validation` when a supplied id is not a UUID
    /// - `AlreadyExists` when the id is already stored
    fn save(&self, device: Device) -> Result<String>;

    fn find_by_id(&self, id: &str) -> Result<Option<Device>>;

    /// Hand every device matching `filter` to `visit`
    ///
    /// The context is checked once per record; on cancellation the search
    /// stops and returns the error, results already visited stay delivered.
    /// An error from `visit` also stops the search.
    fn search(
        &self,
        ctx: &CallContext,
        filter: &Filter,
        visit: &mut dyn FnMut(Device) -> Result<()>,
    ) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryDeviceStore {
    devices: Mutex<HashMap<String, Device>>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeviceStore for InMemoryDeviceStore {
    fn save(&self, mut device: Device) -> Result<String> {
        if device.id.is_empty() {
            device.id = Uuid::new_v4().to_string();
        } else {
            Uuid::parse_str(&device.id).map_err(|e| {
                CatalogError::Validation(format!("device ID is not a valid UUID: {}", e))
            })?;
        }

        let mut devices = self.devices.lock();
        if devices.contains_key(&device.id) {
            return Err(CatalogError::AlreadyExists(format!(
                "device with ID {} already exists",
                device.id
            )));
        }

        let id = device.id.clone();
        devices.insert(id.clone(), device);
        debug!(device_id = %id, "Device saved");
        Ok(id)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Device>> {
        Ok(self.devices.lock().get(id).cloned())
    }

    fn search(
        &self,
        ctx: &CallContext,
        filter: &Filter,
        visit: &mut dyn FnMut(Device) -> Result<()>,
    ) -> Result<()> {
        // Held for the whole iteration, including the visit callback
        let devices = self.devices.lock();

        for device in devices.values() {
            ctx.check()?;

            if matches_filter(filter, device) {
                visit(device.clone())?;
            }
        }

        Ok(())
    }
}
