//! Per-driver-kind probing
//!
//! A [`UsbSerialProber`] pairs one driver kind's capability table with its
//! factory. Probing checks the table first and only opens the device when the
//! identity is listed, so unsupported devices never see an open call.

use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::host::{UsbDevice, UsbManager};
use crate::usb_ids::{CapabilityTable, UsbId};

/// A factory that declined to build a driver from an opened channel
///
/// The channel is handed back so the prober can release it.
pub struct Rejected<C> {
    pub connection: C,
    pub reason: String,
}

impl<C> Rejected<C> {
    pub fn new(connection: C, reason: impl Into<String>) -> Self {
        Self {
            connection,
            reason: reason.into(),
        }
    }
}

impl<C> fmt::Debug for Rejected<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Builds drivers of one kind from opened channels
pub trait DriverFactory<M: UsbManager>: Send + Sync {
    /// Driver handle produced by this factory
    type Driver;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Devices this driver kind can drive
    fn supported_devices(&self) -> &CapabilityTable;

    /// Construct a driver that takes ownership of `connection`
    ///
    /// On failure the connection must be returned inside [`Rejected`].
    fn build(
        &self,
        device: &M::Device,
        connection: M::Connection,
        manager: &M,
    ) -> Result<Self::Driver, Rejected<M::Connection>>;
}

/// Capability check plus driver construction for one driver kind
pub struct UsbSerialProber<M: UsbManager, D> {
    factory: Box<dyn DriverFactory<M, Driver = D>>,
}

impl<M: UsbManager, D> UsbSerialProber<M, D> {
    pub fn new<F>(factory: F) -> Self
    where
        F: DriverFactory<M, Driver = D> + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        self.factory.name()
    }

    /// Check the capability table without touching the device
    pub fn supports(&self, id: UsbId) -> bool {
        self.factory.supported_devices().supports(id)
    }

    /// Try to claim `device` for this driver kind
    ///
    /// Returns `None` when the identity is not listed, when the device cannot
    /// be opened, or when the factory rejects the opened channel. In the last
    /// case the channel is released through the manager before returning.
    pub fn probe(&self, manager: &M, device: &M::Device) -> Option<D> {
        let id = device.identity();
        if !self.supports(id) {
            trace!("{}: {} not in capability table", self.name(), id);
            return None;
        }

        let connection = match manager.open_device(device) {
            Ok(connection) => connection,
            Err(e) => {
                debug!("{}: could not open {} ({}): {}", self.name(), device.name(), id, e);
                return None;
            }
        };

        match self.factory.build(device, connection, manager) {
            Ok(driver) => {
                info!("{}: claimed {} ({})", self.name(), device.name(), id);
                Some(driver)
            }
            Err(Rejected { connection, reason }) => {
                warn!(
                    "{}: driver construction failed for {} ({}): {}",
                    self.name(),
                    device.name(),
                    id,
                    reason
                );
                manager.close_device(connection);
                None
            }
        }
    }
}

impl<M: UsbManager, D> fmt::Debug for UsbSerialProber<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbSerialProber")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, FakeManager, TestFactory};

    const ID: UsbId = UsbId::new(0x1234, 0x0001);

    #[test]
    fn test_unsupported_device_is_never_opened() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", UsbId::new(0x9999, 1))]);
        let prober = UsbSerialProber::new(TestFactory::new("a", &[ID]));

        assert!(prober.probe(&manager, &manager.devices[0]).is_none());
        assert_eq!(manager.open_attempts(), 0);
    }

    #[test]
    fn test_supported_device_is_built() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ID)]);
        let prober = UsbSerialProber::new(TestFactory::new("a", &[ID]));

        let driver = prober.probe(&manager, &manager.devices[0]).unwrap();
        assert_eq!(driver.factory, "a");
        assert_eq!(driver.id, ID);
        assert_eq!(manager.open_attempts(), 1);
        assert_eq!(manager.closed(), 0);
    }

    #[test]
    fn test_open_failure_is_no_match() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ID).unopenable()]);
        let prober = UsbSerialProber::new(TestFactory::new("a", &[ID]));

        assert!(prober.probe(&manager, &manager.devices[0]).is_none());
        assert_eq!(manager.open_attempts(), 1);
    }

    #[test]
    fn test_rejected_channel_is_released() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ID)]);
        let prober = UsbSerialProber::new(TestFactory::new("a", &[ID]).rejecting());

        assert!(prober.probe(&manager, &manager.devices[0]).is_none());
        assert_eq!(manager.open_attempts(), 1);
        assert_eq!(manager.closed(), 1);
    }
}
