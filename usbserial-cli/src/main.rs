//! USB Serial Probe Command Line
//!
//! Lists attached USB devices, reports which serial driver would claim each,
//! and acquires drivers on a real host or a simulated device set.

mod commands;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usbserial_probe::{resolver_with_extra_devices, DeviceScanner, SerialPortManager, UsbId};
use usbserial_sim::{VirtualDeviceSet, VirtualUsbManager};

#[derive(Debug, Parser)]
#[command(name = "usbserial", version, about = "Find and open supported USB serial devices")]
struct Cli {
    /// Settings file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a simulated host described by a JSON device set
    #[arg(long, global = true, value_name = "DEVICES_JSON")]
    simulate: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Scan(ScanCommand),
    /// Print the effective settings, optionally writing them out
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

/// Commands that need a host
#[derive(Debug, Subcommand)]
enum ScanCommand {
    /// List attached devices and the driver that would claim each
    List,
    /// Open the first supported device
    Acquire {
        /// Open every supported device instead of the first
        #[arg(long)]
        all: bool,
    },
    /// Report which driver supports a vvvv:pppp identity
    Check { id: UsbId },
}

fn main() -> ExitCode {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "usbserial=info,usbserial_probe=info,usbserial_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_or_default(path),
        None => Settings::load(),
    };

    let command = match cli.command {
        Command::Config { save } => return config(&settings, cli.config.as_deref(), save),
        Command::Scan(command) => command,
    };

    match &cli.simulate {
        Some(path) => {
            let host = match VirtualDeviceSet::load(path).and_then(VirtualUsbManager::from_set) {
                Ok(host) => host,
                Err(e) => {
                    error!("{}", e);
                    return ExitCode::from(2);
                }
            };
            info!("Simulating {} device(s) from {}", host.devices().len(), path.display());
            let scanner = DeviceScanner::new(
                host,
                resolver_with_extra_devices(settings.extra_devices.iter().copied()),
            );
            run(&scanner, &command)
        }
        None => {
            let scanner = DeviceScanner::new(
                SerialPortManager::with_config(settings.port.clone()),
                resolver_with_extra_devices(settings.extra_devices.iter().copied()),
            );
            run(&scanner, &command)
        }
    }
}

fn run<M: usbserial_probe::UsbManager>(scanner: &commands::Scanner<M>, command: &ScanCommand) -> ExitCode {
    match command {
        ScanCommand::List => commands::list(scanner),
        ScanCommand::Acquire { all } => commands::acquire(scanner, *all),
        ScanCommand::Check { id } => commands::check(scanner, *id),
    }
}

fn config(settings: &Settings, path: Option<&std::path::Path>, save: bool) -> ExitCode {
    match serde_json::to_string_pretty(settings) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    }

    if !save {
        return ExitCode::SUCCESS;
    }

    let saved = match path {
        Some(path) => settings.save_to(path).map(|_| path.to_path_buf()),
        None => settings.save(),
    };
    match saved {
        Ok(path) => {
            info!("Saved settings to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}
