//! Virtual USB devices

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use usbserial_probe::{UsbDevice, UsbId};

use crate::error::SimError;

/// A simulated attached device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDevice {
    /// Host device name
    pub name: String,
    /// Vendor/product pair, written as `vvvv:pppp`
    pub id: UsbId,
    /// USB product string
    #[serde(default)]
    pub product: Option<String>,
    /// Whether the caller holds permission for the device
    #[serde(default = "default_true")]
    pub permitted: bool,
    /// Whether opening the device succeeds
    #[serde(default = "default_true")]
    pub openable: bool,
}

fn default_true() -> bool {
    true
}

impl VirtualDevice {
    /// Create a permitted, openable device
    pub fn new(name: impl Into<String>, id: UsbId) -> Self {
        Self {
            name: name.into(),
            id,
            product: None,
            permitted: true,
            openable: true,
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    /// Device the caller has no permission for
    pub fn denied(mut self) -> Self {
        self.permitted = false;
        self
    }

    /// Device whose open call fails
    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }
}

impl UsbDevice for VirtualDevice {
    fn identity(&self) -> UsbId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A set of devices, as stored in a JSON device set file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDeviceSet {
    pub devices: Vec<VirtualDevice>,
}

impl VirtualDeviceSet {
    /// Parse a device set from JSON
    ///
    /// Device names must be unique within the set.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let set: Self = serde_json::from_str(json)?;
        set.check_names()?;
        Ok(set)
    }

    /// Fail on the first device whose name repeats an earlier one
    pub fn check_names(&self) -> Result<(), SimError> {
        let mut seen = HashSet::new();
        match self.devices.iter().find(|d| !seen.insert(d.name.as_str())) {
            Some(duplicate) => Err(SimError::DeviceExists(duplicate.name.clone())),
            None => Ok(()),
        }
    }

    /// Load a device set from a JSON file
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
