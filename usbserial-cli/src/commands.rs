//! Subcommand implementations, generic over the host backend

use std::process::ExitCode;

use tracing::error;
use usbserial_probe::{DeviceScanner, UsbId, UsbManager, UsbSerialDriver};

/// Scanner over the built-in driver kinds for host `M`
pub type Scanner<M> = DeviceScanner<M, UsbSerialDriver<<M as UsbManager>::Connection>>;

/// Print every attached device and the driver that would claim it
pub fn list<M: UsbManager>(scanner: &Scanner<M>) -> ExitCode {
    let reports = match scanner.enumerate() {
        Ok(reports) => reports,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    for report in reports {
        let vendor = report.vendor.unwrap_or("-");
        let driver = report.driver.as_deref().unwrap_or("unsupported");
        let access = if report.permitted { "" } else { " (no permission)" };
        println!("{:<24} {}  {:<10} {}{}", report.name, report.identity, vendor, driver, access);
    }
    ExitCode::SUCCESS
}

/// Acquire the first (or every) supported device, report it, and release it
pub fn acquire<M: UsbManager>(scanner: &Scanner<M>, all: bool) -> ExitCode {
    let drivers = if all {
        scanner.acquire_all()
    } else {
        scanner.acquire_any().into_iter().collect()
    };

    if drivers.is_empty() {
        println!("no supported device");
        return ExitCode::from(1);
    }

    for driver in drivers {
        println!("{} {} {}", driver.kind(), driver.identity(), driver.device_name());
        driver.close(scanner.manager());
    }
    ExitCode::SUCCESS
}

/// Report which prober would claim `id`
pub fn check<M: UsbManager>(scanner: &Scanner<M>, id: UsbId) -> ExitCode {
    match scanner.resolver().classify(id) {
        Some(name) => {
            println!("{} -> {}", id, name);
            ExitCode::SUCCESS
        }
        None => {
            println!("{} -> unsupported", id);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbserial_probe::usb_ids::{arduino, medtronic};
    use usbserial_probe::{default_resolver, DeviceScanner};
    use usbserial_sim::{VirtualDevice, VirtualUsbManager};

    fn scanner(devices: Vec<VirtualDevice>) -> Scanner<VirtualUsbManager> {
        DeviceScanner::new(VirtualUsbManager::new(devices), default_resolver())
    }

    #[test]
    fn test_acquire_releases_drivers() {
        let scanner = scanner(vec![
            VirtualDevice::new("ttyACM0", arduino::UNO_R3),
            VirtualDevice::new("ttyUSB0", medtronic::CARELINK_USB),
        ]);

        assert_eq!(acquire(&scanner, true), ExitCode::SUCCESS);

        let stats = scanner.manager().stats();
        assert_eq!(stats.opened, 2);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.live_connections, 0);
    }

    #[test]
    fn test_acquire_nothing_supported() {
        let scanner = scanner(vec![VirtualDevice::new("ttyUSB0", UsbId::new(0x0403, 0x6001))]);
        assert_eq!(acquire(&scanner, false), ExitCode::from(1));
    }

    #[test]
    fn test_check() {
        let scanner = scanner(Vec::new());
        assert_eq!(check(&scanner, medtronic::CARELINK_USB), ExitCode::SUCCESS);
        assert_eq!(check(&scanner, UsbId::new(0x0403, 0x6001)), ExitCode::from(1));
        assert_eq!(scanner.manager().stats().open_attempts, 0);
    }
}
