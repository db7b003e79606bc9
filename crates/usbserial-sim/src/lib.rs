//! USB Serial Simulation Library
//!
//! This crate provides a simulated USB host for exercising driver resolution
//! without physical hardware. It includes:
//!
//! - **VirtualDevice**: an attached device with switchable permission and
//!   open failure
//! - **VirtualUsbManager**: a [`UsbManager`](usbserial_probe::UsbManager) that
//!   counts permission checks, open attempts and releases
//! - **VirtualConnection**: a loopback channel handed to resolved drivers
//!
//! # Example
//!
//! ```rust
//! use usbserial_probe::{default_resolver, usb_ids::arduino, DeviceScanner, DriverKind};
//! use usbserial_sim::{VirtualDevice, VirtualUsbManager};
//!
//! let host = VirtualUsbManager::new(vec![VirtualDevice::new("ttyACM0", arduino::UNO_R3)]);
//! let scanner = DeviceScanner::new(host, default_resolver());
//!
//! let driver = scanner.acquire_any().unwrap();
//! assert_eq!(driver.kind(), DriverKind::CdcAcm);
//! assert_eq!(scanner.manager().stats().open_attempts, 1);
//! ```

pub mod device;
pub mod error;
pub mod host;

pub use device::{VirtualDevice, VirtualDeviceSet};
pub use error::SimError;
pub use host::{HostStats, VirtualConnection, VirtualUsbManager};
