//! Host backend over the `serialport` crate
//!
//! Only USB serial ports carry a vendor/product pair, so every other port type
//! is left out of the device list.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{available_ports, SerialPort, SerialPortType};
use tracing::{debug, trace};

use crate::error::DetectError;
use crate::host::{UsbDevice, UsbManager};
use crate::usb_ids::UsbId;

/// Information about a USB serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbPortInfo {
    /// Port name (e.g., /dev/ttyACM0, COM3)
    pub port: String,
    /// USB Vendor/Product ID
    pub identity: UsbId,
    /// USB serial number (if available)
    pub serial_number: Option<String>,
    /// USB manufacturer string
    pub manufacturer: Option<String>,
    /// USB product string
    pub product: Option<String>,
}

impl UsbPortInfo {
    /// Create from serialport crate's port info, if it is a USB port
    fn from_serialport(name: String, port_type: &SerialPortType) -> Option<Self> {
        match port_type {
            SerialPortType::UsbPort(usb) => Some(Self {
                port: name,
                identity: UsbId::new(usb.vid, usb.pid),
                serial_number: usb.serial_number.clone(),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            }),
            _ => None,
        }
    }
}

impl UsbDevice for UsbPortInfo {
    fn identity(&self) -> UsbId {
        self.identity
    }

    fn name(&self) -> &str {
        &self.port
    }
}

/// Port settings used when opening a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// Skip ports whose name contains any of these patterns
    pub skip_patterns: Vec<String>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            timeout_ms: 100,
            skip_patterns: vec![
                // Bluetooth ports on macOS
                "Bluetooth".to_string(),
                // Debug/logging ports
                "debug".to_string(),
            ],
        }
    }
}

/// [`UsbManager`] backed by the host's serial port enumeration
#[derive(Debug, Clone, Default)]
pub struct SerialPortManager {
    config: PortConfig,
}

impl SerialPortManager {
    /// Create a manager with default port settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with custom port settings
    pub fn with_config(config: PortConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Check if a port should be skipped
    fn should_skip_port(&self, port: &UsbPortInfo) -> bool {
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern.as_str()))
    }
}

impl UsbManager for SerialPortManager {
    type Device = UsbPortInfo;
    type Connection = Box<dyn SerialPort>;

    fn device_list(&self) -> Result<Vec<UsbPortInfo>, DetectError> {
        let ports = available_ports()?;

        let devices: Vec<_> = ports
            .into_iter()
            .filter_map(|p| UsbPortInfo::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();

        debug!("{} USB serial port(s) attached", devices.len());
        Ok(devices)
    }

    fn has_permission(&self, device: &UsbPortInfo) -> bool {
        let permitted = has_access(&device.port);
        trace!("Access check for {}: {}", device.port, permitted);
        permitted
    }

    fn open_device(&self, device: &UsbPortInfo) -> Result<Box<dyn SerialPort>, DetectError> {
        debug!("Opening {} at {} baud", device.port, self.config.baud_rate);

        serialport::new(&device.port, self.config.baud_rate)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .open()
            .map_err(|e| DetectError::OpenFailed {
                device: device.port.clone(),
                reason: e.to_string(),
            })
    }
}

/// Read/write access check that does not open the device node
#[cfg(unix)]
fn has_access(path: &str) -> bool {
    use std::ffi::CString;

    let Ok(path) = CString::new(path) else {
        return false;
    };
    // SAFETY: `path` is a valid NUL-terminated string that outlives the call.
    unsafe { libc::access(path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
}

#[cfg(not(unix))]
fn has_access(_path: &str) -> bool {
    true
}
