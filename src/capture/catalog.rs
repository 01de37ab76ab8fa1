//! Device catalog
//!
//! Projects the platform device list into the set of devices the session may
//! use: connected, not suspended, one entry per identity.

use super::traits::{DeviceDescriptor, DevicePosition, DeviceProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// How discovered devices are turned into the selectable list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscoveryPolicy {
    /// Every discovered device (desktop style)
    #[default]
    All,
    /// Default device, then the first back and first front device (mobile style)
    PrimaryPerPosition,
}

/// Read-only view over the platform's capture devices
#[derive(Clone)]
pub struct DeviceCatalog {
    provider: Arc<dyn DeviceProvider>,
    policy: DiscoveryPolicy,
}

impl DeviceCatalog {
    pub fn new(provider: Arc<dyn DeviceProvider>, policy: DiscoveryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &Arc<dyn DeviceProvider> {
        &self.provider
    }

    /// Available devices in discovery order, deduplicated by identity.
    ///
    /// An empty list is a valid answer.
    pub fn list_devices(&self) -> Vec<DeviceDescriptor> {
        let candidates = match self.policy {
            DiscoveryPolicy::All => self.provider.devices(),
            DiscoveryPolicy::PrimaryPerPosition => {
                let discovered = self.provider.devices();
                let mut devices = Vec::new();
                devices.extend(self.provider.default_video_device());
                devices.extend(first_at(&discovered, DevicePosition::Back));
                devices.extend(first_at(&discovered, DevicePosition::Front));
                devices
            }
        };

        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(DeviceDescriptor::is_available)
            .filter(|device| seen.insert(device.identity.clone()))
            .collect()
    }

    /// Available devices facing the given way
    pub fn devices_for_position(&self, position: DevicePosition) -> Vec<DeviceDescriptor> {
        self.list_devices()
            .into_iter()
            .filter(|device| device.position == position)
            .collect()
    }

    /// Device to use for a requested position
    pub fn device_for_position(&self, position: DevicePosition) -> Option<DeviceDescriptor> {
        match position {
            DevicePosition::Unspecified => self.provider.default_video_device(),
            position => self.devices_for_position(position).into_iter().next(),
        }
    }

    /// Next device after `current`, wrapping around.
    ///
    /// Falls back to the system default when `current` is unknown.
    pub fn next_device(&self, current: Option<&DeviceDescriptor>) -> Option<DeviceDescriptor> {
        let devices = self.list_devices();
        let index = current.and_then(|current| {
            devices
                .iter()
                .position(|device| device.identity == current.identity)
        });

        match index {
            Some(index) => devices.get((index + 1) % devices.len()).cloned(),
            None => self.provider.default_video_device(),
        }
    }

    pub fn default_audio_device(&self) -> Option<DeviceDescriptor> {
        self.provider.default_audio_device()
    }

    /// Look up an available device by identity
    pub fn find(&self, identity: &str) -> Option<DeviceDescriptor> {
        self.list_devices()
            .into_iter()
            .find(|device| device.identity == identity)
    }
}

fn first_at(devices: &[DeviceDescriptor], position: DevicePosition) -> Option<DeviceDescriptor> {
    devices
        .iter()
        .find(|device| device.position == position)
        .cloned()
}
