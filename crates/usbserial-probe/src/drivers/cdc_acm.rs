//! CDC-ACM serial devices

use crate::host::UsbManager;
use crate::probe::{DriverFactory, Rejected};
use crate::usb_ids::{arduino, atmel, dexcom, leaflabs, teensy, CapabilityTable, VendorProducts};

use super::{DriverKind, UsbSerialDriver};

static VENDORS: [VendorProducts; 5] = [
    VendorProducts::new(arduino::VID, arduino::ALL_PIDS),
    VendorProducts::new(teensy::VID, teensy::ALL_PIDS),
    VendorProducts::new(atmel::VID, atmel::ALL_PIDS),
    VendorProducts::new(leaflabs::VID, leaflabs::ALL_PIDS),
    VendorProducts::new(dexcom::VID, dexcom::ALL_PIDS),
];

/// Devices known to enumerate as CDC-ACM
pub static SUPPORTED_DEVICES: CapabilityTable = CapabilityTable::from_static(&VENDORS);

/// Builds CDC-ACM drivers
#[derive(Debug, Clone)]
pub struct CdcAcmFactory {
    name: &'static str,
    table: CapabilityTable,
}

impl CdcAcmFactory {
    /// Factory over the built-in device table
    pub fn new() -> Self {
        Self {
            name: "cdc-acm",
            table: SUPPORTED_DEVICES.clone(),
        }
    }

    /// Factory over a user-supplied device table
    pub fn custom(table: CapabilityTable) -> Self {
        Self {
            name: "cdc-acm-custom",
            table,
        }
    }
}

impl Default for CdcAcmFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: UsbManager> DriverFactory<M> for CdcAcmFactory {
    type Driver = UsbSerialDriver<M::Connection>;

    fn name(&self) -> &str {
        self.name
    }

    fn supported_devices(&self) -> &CapabilityTable {
        &self.table
    }

    fn build(
        &self,
        device: &M::Device,
        connection: M::Connection,
        _manager: &M,
    ) -> Result<Self::Driver, Rejected<M::Connection>> {
        Ok(UsbSerialDriver::new(DriverKind::CdcAcm, device, connection))
    }
}
