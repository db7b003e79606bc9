//! Host USB access
//!
//! The resolver never talks to the operating system directly. Everything it
//! needs from the USB layer goes through [`UsbManager`].

use crate::error::DetectError;
use crate::usb_ids::UsbId;

/// An attached device as reported by the host
pub trait UsbDevice {
    /// Vendor/product pair used for all matching
    fn identity(&self) -> UsbId;

    /// Host name for the device (e.g. `/dev/ttyACM0`, `COM3`)
    fn name(&self) -> &str;
}

/// Device listing, permission and open primitives of the host USB layer
pub trait UsbManager {
    /// Device handle yielded by [`UsbManager::device_list`]
    type Device: UsbDevice;
    /// Open channel to a device
    type Connection;

    /// Snapshot of the currently attached devices, in host order
    fn device_list(&self) -> Result<Vec<Self::Device>, DetectError>;

    /// Whether the caller may open this device
    ///
    /// Must not open the device.
    fn has_permission(&self, device: &Self::Device) -> bool;

    /// Open a channel to the device
    fn open_device(&self, device: &Self::Device) -> Result<Self::Connection, DetectError>;

    /// Release a channel that no driver took ownership of
    fn close_device(&self, connection: Self::Connection) {
        drop(connection);
    }
}
