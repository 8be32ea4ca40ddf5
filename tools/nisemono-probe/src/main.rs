//! Query tool for the nisemono virtual I2C chip.
//!
//! Attaches a stub chip to a fresh bus registry and exercises it with the
//! client driver, issuing the same two-message exchanges a real driver
//! would: identify first, then the firmware-version query.

use anyhow::{Context, Result};
use clap::Parser;
use nisemono_i2c::chip::stub::{DEFAULT_ADDRESS, DEFAULT_FIRMWARE_VERSION};
use nisemono_i2c::{Registry, StubChip, TesterClient};

/// Exercise the virtual I2C test chip and print what it reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Firmware version the emulated chip reports (decimal or 0x-hex)
    #[arg(short = 'f', long, value_parser = parse_u16)]
    firmware: Option<u16>,

    /// Slave address the emulated chip answers on (decimal or 0x-hex)
    #[arg(short = 's', long, value_parser = parse_u8)]
    address: Option<u8>,

    /// Repeat the firmware query this many times
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: u32,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("nisemono_i2c=debug".parse()?),
            )
            .init();
    } else {
        nisemono_i2c::tracing::init_stdout();
    }

    let firmware = args.firmware.unwrap_or(DEFAULT_FIRMWARE_VERSION);
    let address = args.address.unwrap_or(DEFAULT_ADDRESS);

    let mut registry = Registry::new();
    let nr = registry.attach(Box::new(StubChip::with_identity(firmware, address)));
    println!("virtual chip at 0x{:02x} on {}", address, nr);

    let adapter = registry
        .adapter_mut(nr)
        .context("adapter vanished after attach")?;
    let mut client = TesterClient::new_with_address(adapter, nr, address);

    let identity = client.identify().context("identify query failed")?;
    println!(
        "identity: status 0x{:02x}, protocol v{}, bus {}",
        identity.status, identity.bus_major_version, identity.bus_number
    );

    for _ in 0..args.repeat {
        let version = client
            .firmware_version()
            .context("firmware version query failed")?;
        println!("firmware version: 0x{:02x}", version);
    }

    registry.detach(nr);
    Ok(())
}

fn parse_u16(s: &str) -> Result<u16, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn parse_u8(s: &str) -> Result<u8, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}
