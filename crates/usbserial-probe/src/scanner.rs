//! Attached device scanning
//!
//! Every call takes a fresh device snapshot from the host; nothing is cached
//! between calls. Callers re-scan after a hot-plug notification.

use tracing::{info, warn};

use crate::error::DetectError;
use crate::host::{UsbDevice, UsbManager};
use crate::resolver::UsbSerialResolver;
use crate::usb_ids::{vendor_name, UsbId};

/// Summary of an attached device, produced without opening it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    /// Host device name
    pub name: String,
    /// Vendor/product pair
    pub identity: UsbId,
    /// Manufacturer name, if the vendor is known
    pub vendor: Option<&'static str>,
    /// Prober that would claim the device
    pub driver: Option<String>,
    /// Whether the caller may open the device
    pub permitted: bool,
}

/// Resolves attached devices to drivers
pub struct DeviceScanner<M: UsbManager, D> {
    manager: M,
    resolver: UsbSerialResolver<M, D>,
}

impl<M: UsbManager, D> DeviceScanner<M, D> {
    pub fn new(manager: M, resolver: UsbSerialResolver<M, D>) -> Self {
        Self { manager, resolver }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut M {
        &mut self.manager
    }

    pub fn resolver(&self) -> &UsbSerialResolver<M, D> {
        &self.resolver
    }

    /// List attached devices and which prober would claim each
    pub fn enumerate(&self) -> Result<Vec<DeviceReport>, DetectError> {
        info!("Enumerating USB devices...");
        let devices = self.manager.device_list()?;

        let reports: Vec<_> = devices
            .iter()
            .map(|device| {
                let identity = device.identity();
                DeviceReport {
                    name: device.name().to_string(),
                    identity,
                    vendor: vendor_name(identity.vid),
                    driver: self.resolver.classify(identity).map(str::to_string),
                    permitted: self.manager.has_permission(device),
                }
            })
            .collect();

        if reports.is_empty() {
            info!("No USB devices found");
        } else {
            info!("Found {} USB device(s)", reports.len());
            for report in &reports {
                let driver = report.driver.as_deref().unwrap_or("unsupported");
                info!("  {} [{}] - {}", report.name, report.identity, driver);
            }
        }

        Ok(reports)
    }

    /// Build a driver for one device
    pub fn resolve(&self, device: &M::Device) -> Option<D> {
        self.resolver.resolve(&self.manager, device)
    }

    /// Build a driver for the first attached device any prober claims
    pub fn acquire_any(&self) -> Option<D> {
        let devices = self.snapshot()?;
        let driver = devices.iter().find_map(|device| self.resolve(device));
        if driver.is_none() {
            info!("No supported USB serial device found");
        }
        driver
    }

    /// Build a driver for every attached device some prober claims
    pub fn acquire_all(&self) -> Vec<D> {
        self.snapshot()
            .map(|devices| devices.iter().filter_map(|d| self.resolve(d)).collect())
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Option<Vec<M::Device>> {
        match self.manager.device_list() {
            Ok(devices) => Some(devices),
            Err(e) => {
                warn!("Device enumeration failed: {}", e);
                None
            }
        }
    }
}
