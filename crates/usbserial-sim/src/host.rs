//! Simulated USB host
//!
//! Permission and open checks consult the host's current device list, so a
//! device detached after a snapshot was taken behaves like one that vanished.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};
use usbserial_probe::{DetectError, UsbId, UsbManager};

use crate::device::{VirtualDevice, VirtualDeviceSet};
use crate::error::SimError;

#[derive(Debug, Default)]
struct Counters {
    permission_checks: AtomicUsize,
    open_attempts: AtomicUsize,
    opened: AtomicUsize,
    released: AtomicUsize,
    live: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Snapshot of host activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Permission checks performed
    pub permission_checks: usize,
    /// Open calls, successful or not
    pub open_attempts: usize,
    /// Open calls that produced a connection
    pub opened: usize,
    /// Connections handed back through `close_device`
    pub released: usize,
    /// Connections not yet dropped
    pub live_connections: usize,
}

/// A [`UsbManager`] over an in-memory device list
#[derive(Debug, Default)]
pub struct VirtualUsbManager {
    devices: Vec<VirtualDevice>,
    counters: Arc<Counters>,
}

impl VirtualUsbManager {
    /// Host with `devices` attached in order
    ///
    /// A device whose name is already taken is not attached.
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        let mut host = Self::default();
        for device in devices {
            if let Err(e) = host.attach(device) {
                warn!("Skipping virtual device: {}", e);
            }
        }
        host
    }

    /// Host with every device of `set` attached, rejecting repeated names
    pub fn from_set(set: VirtualDeviceSet) -> Result<Self, SimError> {
        set.check_names()?;
        Ok(Self::new(set.devices))
    }

    /// Attached devices, in enumeration order
    pub fn devices(&self) -> &[VirtualDevice] {
        &self.devices
    }

    /// Attach a device at the end of the enumeration order
    pub fn attach(&mut self, device: VirtualDevice) -> Result<(), SimError> {
        if self.find(&device.name).is_some() {
            return Err(SimError::DeviceExists(device.name));
        }
        debug!("Attached virtual device {} ({})", device.name, device.id);
        self.devices.push(device);
        Ok(())
    }

    /// Detach a device by name
    pub fn detach(&mut self, name: &str) -> Result<VirtualDevice, SimError> {
        let index = self
            .devices
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| SimError::DeviceNotFound(name.to_string()))?;
        debug!("Detached virtual device {}", name);
        Ok(self.devices.remove(index))
    }

    pub fn set_permitted(&mut self, name: &str, permitted: bool) -> Result<(), SimError> {
        self.find_mut(name)?.permitted = permitted;
        Ok(())
    }

    pub fn set_openable(&mut self, name: &str, openable: bool) -> Result<(), SimError> {
        self.find_mut(name)?.openable = openable;
        Ok(())
    }

    pub fn stats(&self) -> HostStats {
        let c = &self.counters;
        HostStats {
            permission_checks: c.permission_checks.load(Ordering::SeqCst),
            open_attempts: c.open_attempts.load(Ordering::SeqCst),
            opened: c.opened.load(Ordering::SeqCst),
            released: c.released.load(Ordering::SeqCst),
            live_connections: c.live.load(Ordering::SeqCst),
        }
    }

    fn find(&self, name: &str) -> Option<&VirtualDevice> {
        self.devices.iter().find(|d| d.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut VirtualDevice, SimError> {
        self.devices
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| SimError::DeviceNotFound(name.to_string()))
    }
}

impl UsbManager for VirtualUsbManager {
    type Device = VirtualDevice;
    type Connection = VirtualConnection;

    fn device_list(&self) -> Result<Vec<VirtualDevice>, DetectError> {
        Ok(self.devices.clone())
    }

    fn has_permission(&self, device: &VirtualDevice) -> bool {
        Counters::bump(&self.counters.permission_checks);
        self.find(&device.name).is_some_and(|d| d.permitted)
    }

    fn open_device(&self, device: &VirtualDevice) -> Result<VirtualConnection, DetectError> {
        Counters::bump(&self.counters.open_attempts);

        let reason = match self.find(&device.name) {
            Some(d) if d.openable => {
                Counters::bump(&self.counters.opened);
                Counters::bump(&self.counters.live);
                return Ok(VirtualConnection {
                    device: d.name.clone(),
                    identity: d.id,
                    buffer: VecDeque::new(),
                    counters: Arc::clone(&self.counters),
                });
            }
            Some(_) => "open refused",
            None => "device disconnected",
        };

        Err(DetectError::OpenFailed {
            device: device.name.clone(),
            reason: reason.to_string(),
        })
    }

    fn close_device(&self, connection: VirtualConnection) {
        Counters::bump(&self.counters.released);
        drop(connection);
    }
}

/// Loopback channel to a virtual device
///
/// Bytes written are queued and read back in order.
#[derive(Debug)]
pub struct VirtualConnection {
    device: String,
    identity: UsbId,
    buffer: VecDeque<u8>,
    counters: Arc<Counters>,
}

impl VirtualConnection {
    pub fn device_name(&self) -> &str {
        &self.device
    }

    pub fn identity(&self) -> UsbId {
        self.identity
    }

    /// Bytes waiting to be read
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Read for VirtualConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }
}

impl Write for VirtualConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for VirtualConnection {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}
