//! USB Vendor/Product ID tables for supported serial devices
//!
//! Every driver kind owns one [`CapabilityTable`] naming the devices it can
//! drive. Built-in tables are `static` and borrowed by the probers; tables
//! assembled from configuration own their entries.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// USB Vendor ID / Product ID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl UsbId {
    pub const fn new(vid: u16, pid: u16) -> Self {
        Self { vid, pid }
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vid, self.pid)
    }
}

impl FromStr for UsbId {
    type Err = DetectError;

    /// Parse the `lsusb` style `vvvv:pppp` form (hex, optional `0x` prefixes)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DetectError::InvalidUsbId(s.to_string());
        let (vid, pid) = s.trim().split_once(':').ok_or_else(invalid)?;
        let parse = |part: &str| {
            let part = part.trim();
            let digits = part
                .strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part);
            u16::from_str_radix(digits, 16).map_err(|_| invalid())
        };
        Ok(Self::new(parse(vid)?, parse(pid)?))
    }
}

impl TryFrom<String> for UsbId {
    type Error = DetectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UsbId> for String {
    fn from(id: UsbId) -> Self {
        id.to_string()
    }
}

/// Product IDs supported for one vendor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorProducts {
    pub vid: u16,
    pub pids: Cow<'static, [u16]>,
}

impl VendorProducts {
    pub const fn new(vid: u16, pids: &'static [u16]) -> Self {
        Self {
            vid,
            pids: Cow::Borrowed(pids),
        }
    }
}

/// Mapping from vendor ID to the set of product IDs a driver kind supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityTable {
    vendors: Cow<'static, [VendorProducts]>,
}

impl CapabilityTable {
    /// Wrap a static table without copying it
    pub const fn from_static(vendors: &'static [VendorProducts]) -> Self {
        Self {
            vendors: Cow::Borrowed(vendors),
        }
    }

    /// Build an owned table, grouping IDs by vendor in first-seen order
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = UsbId>,
    {
        let mut grouped: Vec<(u16, Vec<u16>)> = Vec::new();
        for id in ids {
            match grouped.iter_mut().find(|(vid, _)| *vid == id.vid) {
                Some((_, pids)) => {
                    if !pids.contains(&id.pid) {
                        pids.push(id.pid);
                    }
                }
                None => grouped.push((id.vid, vec![id.pid])),
            }
        }

        let vendors = grouped
            .into_iter()
            .map(|(vid, pids)| VendorProducts {
                vid,
                pids: Cow::Owned(pids),
            })
            .collect::<Vec<_>>();

        Self {
            vendors: Cow::Owned(vendors),
        }
    }

    /// Check whether a device identity is listed
    ///
    /// Unknown vendors are a plain `false`. Matching is exact on both IDs.
    pub fn supports(&self, id: UsbId) -> bool {
        self.vendors
            .iter()
            .filter(|v| v.vid == id.vid)
            .any(|v| v.pids.contains(&id.pid))
    }

    /// Check whether any product of this vendor is listed
    pub fn knows_vendor(&self, vid: u16) -> bool {
        self.vendors.iter().any(|v| v.vid == vid)
    }

    /// Per-vendor entries
    pub fn vendors(&self) -> &[VendorProducts] {
        &self.vendors
    }

    /// Every listed identity, in table order
    pub fn iter(&self) -> impl Iterator<Item = UsbId> + '_ {
        self.vendors
            .iter()
            .flat_map(|v| v.pids.iter().map(move |&pid| UsbId::new(v.vid, pid)))
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.iter().all(|v| v.pids.is_empty())
    }
}

impl FromIterator<UsbId> for CapabilityTable {
    fn from_iter<I: IntoIterator<Item = UsbId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// Arduino boards with native USB CDC
pub mod arduino {
    use super::UsbId;

    pub const VID: u16 = 0x2341;

    pub const UNO: UsbId = UsbId::new(VID, 0x0001);
    pub const MEGA_2560: UsbId = UsbId::new(VID, 0x0010);
    pub const SERIAL_ADAPTER: UsbId = UsbId::new(VID, 0x003B);
    pub const MEGA_ADK: UsbId = UsbId::new(VID, 0x003F);
    pub const MEGA_2560_R3: UsbId = UsbId::new(VID, 0x0042);
    pub const UNO_R3: UsbId = UsbId::new(VID, 0x0043);
    pub const MEGA_ADK_R3: UsbId = UsbId::new(VID, 0x0044);
    pub const LEONARDO: UsbId = UsbId::new(VID, 0x8036);

    /// All known Arduino CDC product IDs
    pub const ALL_PIDS: &[u16] = &[
        0x0001, 0x0010, 0x003B, 0x003F, 0x0042, 0x0043, 0x0044, 0x8036,
    ];
}

/// Van Ooijen Technische Informatica (Teensy)
pub mod teensy {
    use super::UsbId;

    pub const VID: u16 = 0x16C0;

    pub const TEENSYDUINO_SERIAL: UsbId = UsbId::new(VID, 0x0483);

    pub const ALL_PIDS: &[u16] = &[0x0483];
}

/// Atmel LUFA demo firmware
pub mod atmel {
    use super::UsbId;

    pub const VID: u16 = 0x03EB;

    pub const LUFA_CDC_DEMO_APP: UsbId = UsbId::new(VID, 0x2044);

    pub const ALL_PIDS: &[u16] = &[0x2044];
}

/// Leaflabs Maple
pub mod leaflabs {
    use super::UsbId;

    pub const VID: u16 = 0x1EAF;

    pub const MAPLE: UsbId = UsbId::new(VID, 0x0004);

    pub const ALL_PIDS: &[u16] = &[0x0004];
}

/// Dexcom continuous glucose monitor receivers
pub mod dexcom {
    use super::UsbId;

    pub const VID: u16 = 0x22A3;

    pub const G4_RECEIVER: UsbId = UsbId::new(VID, 0x0047);

    pub const ALL_PIDS: &[u16] = &[0x0047];
}

/// Medtronic CareLink USB stick
pub mod medtronic {
    use super::UsbId;

    pub const VID: u16 = 0x0A21;

    pub const CARELINK_USB: UsbId = UsbId::new(VID, 0x8001);

    pub const ALL_PIDS: &[u16] = &[0x8001];
}

/// Get manufacturer name from VID
pub fn vendor_name(vid: u16) -> Option<&'static str> {
    match vid {
        arduino::VID => Some("Arduino"),
        teensy::VID => Some("Teensy"),
        atmel::VID => Some("Atmel"),
        leaflabs::VID => Some("Leaflabs"),
        dexcom::VID => Some("Dexcom"),
        medtronic::VID => Some("Medtronic"),
        _ => None,
    }
}
