//! Ordered driver resolution for a single device
//!
//! Probers are tried in registration order and the first one that claims the
//! device wins. When two capability tables list the same identity, the prober
//! registered first takes it; the later one is never consulted.

use std::fmt;

use tracing::{debug, info};

use crate::host::{UsbDevice, UsbManager};
use crate::probe::{DriverFactory, UsbSerialProber};
use crate::usb_ids::UsbId;

/// Ordered collection of probers
pub struct UsbSerialResolver<M: UsbManager, D> {
    probers: Vec<UsbSerialProber<M, D>>,
}

impl<M: UsbManager, D> UsbSerialResolver<M, D> {
    /// Create a resolver with no probers registered
    pub fn new() -> Self {
        Self {
            probers: Vec::new(),
        }
    }

    /// Append a prober built from `factory`, after all existing ones
    pub fn register<F>(&mut self, factory: F)
    where
        F: DriverFactory<M, Driver = D> + 'static,
    {
        self.probers.push(UsbSerialProber::new(factory));
    }

    /// Builder form of [`UsbSerialResolver::register`]
    pub fn with<F>(mut self, factory: F) -> Self
    where
        F: DriverFactory<M, Driver = D> + 'static,
    {
        self.register(factory);
        self
    }

    /// Registered prober names, in trial order
    pub fn prober_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.probers.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.probers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probers.is_empty()
    }

    /// Name of the prober that would claim `id`, without opening anything
    pub fn classify(&self, id: UsbId) -> Option<&str> {
        self.probers
            .iter()
            .find(|p| p.supports(id))
            .map(|p| p.name())
    }

    /// Build a driver for `device`, or `None` if no prober claims it
    ///
    /// Devices the caller has no permission for are skipped before any prober
    /// runs.
    pub fn resolve(&self, manager: &M, device: &M::Device) -> Option<D> {
        let id = device.identity();
        if !manager.has_permission(device) {
            info!("No permission for {}", id);
            return None;
        }

        let driver = self
            .probers
            .iter()
            .find_map(|prober| prober.probe(manager, device));

        if driver.is_none() {
            debug!("No driver for {} ({})", device.name(), id);
        }
        driver
    }
}

impl<M: UsbManager, D> Default for UsbSerialResolver<M, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: UsbManager, D> fmt::Debug for UsbSerialResolver<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.prober_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BuiltDriver, FakeDevice, FakeManager, TestFactory};
    use std::io;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink shared between a test and its subscriber
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    const SHARED: UsbId = UsbId::new(0x2341, 0x0043);
    const ONLY_B: UsbId = UsbId::new(0x0A21, 0x8001);

    fn resolver() -> UsbSerialResolver<FakeManager, BuiltDriver> {
        UsbSerialResolver::new()
            .with(TestFactory::new("a", &[SHARED]))
            .with(TestFactory::new("b", &[SHARED, ONLY_B]))
    }

    #[test]
    fn test_first_registered_prober_wins() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", SHARED)]);
        let driver = resolver().resolve(&manager, &manager.devices[0]).unwrap();

        assert_eq!(driver.factory, "a");
        assert_eq!(manager.open_attempts(), 1);
    }

    #[test]
    fn test_later_prober_claims_when_earlier_does_not_match() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ONLY_B)]);
        let driver = resolver().resolve(&manager, &manager.devices[0]).unwrap();

        assert_eq!(driver.factory, "b");
    }

    #[test]
    fn test_unmatched_device_consults_every_table() {
        let a = TestFactory::new("a", &[SHARED]);
        let b = TestFactory::new("b", &[ONLY_B]);
        let (a_lookups, b_lookups) = (a.lookups.clone(), b.lookups.clone());
        let resolver = UsbSerialResolver::new().with(a).with(b);

        let manager = FakeManager::new(vec![FakeDevice::new("tty0", UsbId::new(0xDEAD, 0xBEEF))]);
        assert!(resolver.resolve(&manager, &manager.devices[0]).is_none());

        assert_eq!(a_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(b_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(manager.open_attempts(), 0);
    }

    #[test]
    fn test_permission_denied_skips_all_probers() {
        let a = TestFactory::new("a", &[SHARED]);
        let a_lookups = a.lookups.clone();
        let resolver = UsbSerialResolver::new().with(a);

        let manager = FakeManager::new(vec![FakeDevice::new("tty0", SHARED).denied()]);
        assert!(resolver.resolve(&manager, &manager.devices[0]).is_none());

        assert_eq!(manager.permission_checks(), 1);
        assert_eq!(manager.open_attempts(), 0);
        assert_eq!(a_lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_permission_denied_logs_identity() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ONLY_B).denied()]);
        tracing::subscriber::with_default(subscriber, || {
            assert!(resolver().resolve(&manager, &manager.devices[0]).is_none());
        });

        assert!(logs.contents().contains("No permission for 0a21:8001"));
    }

    #[test]
    fn test_open_failure_resolves_to_none() {
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ONLY_B).unopenable()]);
        assert!(resolver().resolve(&manager, &manager.devices[0]).is_none());
        assert_eq!(manager.open_attempts(), 1);
    }

    #[test]
    fn test_rejection_falls_through_to_next_prober() {
        let resolver = UsbSerialResolver::new()
            .with(TestFactory::new("a", &[SHARED]).rejecting())
            .with(TestFactory::new("b", &[SHARED]));

        let manager = FakeManager::new(vec![FakeDevice::new("tty0", SHARED)]);
        let driver = resolver.resolve(&manager, &manager.devices[0]).unwrap();

        assert_eq!(driver.factory, "b");
        assert_eq!(manager.open_attempts(), 2);
        assert_eq!(manager.closed(), 1);
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let resolver = resolver();
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", ONLY_B)]);

        let first = resolver.resolve(&manager, &manager.devices[0]).unwrap();
        let second = resolver.resolve(&manager, &manager.devices[0]).unwrap();

        assert_eq!(first.factory, second.factory);
        assert_eq!(manager.open_attempts(), 2);
    }

    #[test]
    fn test_classify_and_names() {
        let resolver = resolver();
        assert_eq!(resolver.classify(SHARED), Some("a"));
        assert_eq!(resolver.classify(ONLY_B), Some("b"));
        assert_eq!(resolver.classify(UsbId::new(1, 1)), None);
        assert_eq!(resolver.prober_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn test_empty_resolver() {
        let resolver: UsbSerialResolver<FakeManager, BuiltDriver> = UsbSerialResolver::default();
        let manager = FakeManager::new(vec![FakeDevice::new("tty0", SHARED)]);

        assert!(resolver.is_empty());
        assert!(resolver.resolve(&manager, &manager.devices[0]).is_none());
    }
}
