//! Medtronic CareLink USB stick

use crate::host::UsbManager;
use crate::probe::{DriverFactory, Rejected};
use crate::usb_ids::{medtronic, CapabilityTable, VendorProducts};

use super::{DriverKind, UsbSerialDriver};

static VENDORS: [VendorProducts; 1] = [VendorProducts::new(medtronic::VID, medtronic::ALL_PIDS)];

pub static SUPPORTED_DEVICES: CapabilityTable = CapabilityTable::from_static(&VENDORS);

/// Builds CareLink drivers
#[derive(Debug, Clone, Copy, Default)]
pub struct CareLinkFactory;

impl<M: UsbManager> DriverFactory<M> for CareLinkFactory {
    type Driver = UsbSerialDriver<M::Connection>;

    fn name(&self) -> &str {
        "carelink"
    }

    fn supported_devices(&self) -> &CapabilityTable {
        &SUPPORTED_DEVICES
    }

    fn build(
        &self,
        device: &M::Device,
        connection: M::Connection,
        _manager: &M,
    ) -> Result<Self::Driver, Rejected<M::Connection>> {
        Ok(UsbSerialDriver::new(DriverKind::CareLink, device, connection))
    }
}
