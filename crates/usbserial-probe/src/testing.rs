//! In-memory host and factory used by the unit tests

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::DetectError;
use crate::host::{UsbDevice, UsbManager};
use crate::probe::{DriverFactory, Rejected};
use crate::usb_ids::{CapabilityTable, UsbId};

#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub name: String,
    pub id: UsbId,
    pub permitted: bool,
    pub openable: bool,
}

impl FakeDevice {
    pub fn new(name: &str, id: UsbId) -> Self {
        Self {
            name: name.to_string(),
            id,
            permitted: true,
            openable: true,
        }
    }

    pub fn denied(mut self) -> Self {
        self.permitted = false;
        self
    }

    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }
}

impl UsbDevice for FakeDevice {
    fn identity(&self) -> UsbId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeConnection(pub UsbId);

#[derive(Debug, Default)]
pub struct FakeManager {
    pub devices: Vec<FakeDevice>,
    listing_fails: bool,
    permission_checks: Cell<usize>,
    open_attempts: Cell<usize>,
    closed: Cell<usize>,
}

impl FakeManager {
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    /// Host whose device listing always fails
    pub fn failing() -> Self {
        Self {
            listing_fails: true,
            ..Default::default()
        }
    }

    pub fn permission_checks(&self) -> usize {
        self.permission_checks.get()
    }

    pub fn open_attempts(&self) -> usize {
        self.open_attempts.get()
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }
}

impl UsbManager for FakeManager {
    type Device = FakeDevice;
    type Connection = FakeConnection;

    fn device_list(&self) -> Result<Vec<FakeDevice>, DetectError> {
        if self.listing_fails {
            let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "listing failed");
            return Err(err.into());
        }
        Ok(self.devices.clone())
    }

    fn has_permission(&self, device: &FakeDevice) -> bool {
        self.permission_checks.set(self.permission_checks.get() + 1);
        device.permitted
    }

    fn open_device(&self, device: &FakeDevice) -> Result<FakeConnection, DetectError> {
        self.open_attempts.set(self.open_attempts.get() + 1);
        if device.openable {
            Ok(FakeConnection(device.id))
        } else {
            Err(DetectError::OpenFailed {
                device: device.name.clone(),
                reason: "device vanished".to_string(),
            })
        }
    }

    fn close_device(&self, connection: FakeConnection) {
        self.closed.set(self.closed.get() + 1);
        drop(connection);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BuiltDriver {
    pub factory: &'static str,
    pub id: UsbId,
    pub connection: FakeConnection,
}

pub struct TestFactory {
    name: &'static str,
    table: CapabilityTable,
    reject: bool,
    pub lookups: Arc<AtomicUsize>,
}

impl TestFactory {
    pub fn new(name: &'static str, ids: &[UsbId]) -> Self {
        Self {
            name,
            table: CapabilityTable::from_ids(ids.iter().copied()),
            reject: false,
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }
}

impl DriverFactory<FakeManager> for TestFactory {
    type Driver = BuiltDriver;

    fn name(&self) -> &str {
        self.name
    }

    fn supported_devices(&self) -> &CapabilityTable {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        &self.table
    }

    fn build(
        &self,
        device: &FakeDevice,
        connection: FakeConnection,
        _manager: &FakeManager,
    ) -> Result<BuiltDriver, Rejected<FakeConnection>> {
        if self.reject {
            return Err(Rejected::new(connection, "test factory rejects everything"));
        }
        Ok(BuiltDriver {
            factory: self.name,
            id: device.id,
            connection,
        })
    }
}
