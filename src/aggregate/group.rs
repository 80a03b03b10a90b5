//! Folds a flat thing list into devices keyed by `device_id`

use std::collections::HashMap;

use crate::models::{Device, Thing};

/// Insertion-ordered `device_id -> Device` map
#[derive(Debug, Default)]
pub struct DeviceIndex {
    positions: HashMap<String, usize>,
    devices: Vec<Device>,
}

impl DeviceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `thing` to its device, creating the device on first sight
    pub fn insert(&mut self, thing: Thing) {
        let position = match self.positions.get(&thing.device_id) {
            Some(&position) => position,
            None => {
                let device = Device::synthesized(&thing.device_id, thing.device_name.as_deref());
                self.devices.push(device);
                let position = self.devices.len() - 1;
                self.positions.insert(thing.device_id.clone(), position);
                position
            }
        };

        if let Some(device) = self.devices.get_mut(position) {
            device.things.push(thing);
        }
    }

    /// Devices in first-seen order
    pub fn into_devices(self) -> Vec<Device> {
        self.devices
    }
}

impl FromIterator<Thing> for DeviceIndex {
    fn from_iter<I: IntoIterator<Item = Thing>>(iter: I) -> Self {
        let mut index = DeviceIndex::new();
        for thing in iter {
            index.insert(thing);
        }
        index
    }
}

pub fn group_by_device(things: impl IntoIterator<Item = Thing>) -> Vec<Device> {
    things.into_iter().collect::<DeviceIndex>().into_devices()
}
