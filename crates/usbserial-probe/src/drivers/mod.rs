//! Built-in USB serial driver kinds
//!
//! Each kind lives in its own module together with the capability table it
//! owns. The framing each kind speaks on the wire is not handled here: a
//! resolved [`UsbSerialDriver`] just binds a device to its open channel.

pub mod carelink;
pub mod cdc_acm;

use std::fmt;
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::host::{UsbDevice, UsbManager};
use crate::resolver::UsbSerialResolver;
use crate::usb_ids::{CapabilityTable, UsbId};

pub use carelink::CareLinkFactory;
pub use cdc_acm::CdcAcmFactory;

/// Identifies which driver implementation handles a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverKind {
    /// USB Communications Device Class, Abstract Control Model
    CdcAcm,
    /// Medtronic CareLink USB stick
    CareLink,
}

impl DriverKind {
    /// Returns a human-readable name for the driver kind
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::CdcAcm => "CDC-ACM",
            DriverKind::CareLink => "CareLink",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved driver bound to one device and its open channel
pub struct UsbSerialDriver<C> {
    kind: DriverKind,
    identity: UsbId,
    device_name: String,
    connection: C,
}

impl<C> UsbSerialDriver<C> {
    pub fn new<D: UsbDevice>(kind: DriverKind, device: &D, connection: C) -> Self {
        Self {
            kind,
            identity: device.identity(),
            device_name: device.name().to_string(),
            connection,
        }
    }

    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    pub fn identity(&self) -> UsbId {
        self.identity
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Give up the driver and keep the channel
    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Release the channel through the host that opened it
    pub fn close<M>(self, manager: &M)
    where
        M: UsbManager<Connection = C>,
    {
        manager.close_device(self.connection);
    }
}

impl<C> fmt::Debug for UsbSerialDriver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbSerialDriver")
            .field("kind", &self.kind)
            .field("identity", &self.identity)
            .field("device_name", &self.device_name)
            .finish_non_exhaustive()
    }
}

impl<C: Read> Read for UsbSerialDriver<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.connection.read(buf)
    }
}

impl<C: Write> Write for UsbSerialDriver<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.connection.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.connection.flush()
    }
}

/// Resolver type produced by [`default_resolver`]
pub type DefaultResolver<M> = UsbSerialResolver<M, UsbSerialDriver<<M as UsbManager>::Connection>>;

/// Resolver with the built-in driver kinds: CDC-ACM first, then CareLink
pub fn default_resolver<M: UsbManager>() -> DefaultResolver<M> {
    UsbSerialResolver::new()
        .with(CdcAcmFactory::new())
        .with(CareLinkFactory)
}

/// Built-in resolver plus a CDC-ACM prober for extra identities
///
/// The extra prober is registered last, so an identity already claimed by a
/// built-in table keeps its built-in driver.
pub fn resolver_with_extra_devices<M, I>(extra: I) -> DefaultResolver<M>
where
    M: UsbManager,
    I: IntoIterator<Item = UsbId>,
{
    let table = CapabilityTable::from_ids(extra);
    let resolver = default_resolver();
    if table.is_empty() {
        resolver
    } else {
        resolver.with(CdcAcmFactory::custom(table))
    }
}
