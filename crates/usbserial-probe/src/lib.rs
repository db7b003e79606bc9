//! USB Serial Driver Probing Library
//!
//! This crate decides which attached USB devices are serial devices the host
//! knows how to drive, and builds a driver bound to an open channel for them.
//!
//! Resolution is ordered and first-match-wins: probers are tried in the order
//! they were registered, each checks its driver kind's capability table, and
//! only a listed device is opened. Every failure along the way is a plain
//! "no match".
//!
//! # Example
//!
//! ```rust,no_run
//! use usbserial_probe::{default_resolver, DeviceScanner, SerialPortManager};
//!
//! let scanner = DeviceScanner::new(SerialPortManager::new(), default_resolver());
//!
//! if let Some(driver) = scanner.acquire_any() {
//!     println!("{} on {}", driver.kind(), driver.device_name());
//! }
//! ```

pub mod drivers;
pub mod error;
pub mod host;
pub mod probe;
pub mod resolver;
pub mod scanner;
pub mod serial_port;
pub mod usb_ids;

#[cfg(test)]
mod testing;

pub use drivers::{
    default_resolver, resolver_with_extra_devices, DefaultResolver, DriverKind, UsbSerialDriver,
};
pub use error::DetectError;
pub use host::{UsbDevice, UsbManager};
pub use probe::{DriverFactory, Rejected, UsbSerialProber};
pub use resolver::UsbSerialResolver;
pub use scanner::{DeviceReport, DeviceScanner};
pub use serial_port::{PortConfig, SerialPortManager, UsbPortInfo};
pub use usb_ids::{CapabilityTable, UsbId, VendorProducts};
