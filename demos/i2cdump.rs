// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Dumps the registers of a device

extern crate docopt;
extern crate flexi_logger;
extern crate i2c_linux;

use docopt::Docopt;
use i2c_linux::{I2cConfig, Result};
use std::env::args;
use std::time::Duration;

const USAGE: &str = "
Dump registers of an I2C device, reading them as I2C blocks when the adapter
allows it and falling back to single SMBus byte reads otherwise.

Usage:
  i2cdump [--force] [--pec] [--bytes] <device> <address>
  i2cdump (-h | --help)
  i2cdump --version

Options:
  -f --force   Access the device even if a kernel driver has claimed it.
  --pec        Enable SMBus packet error checking.
  --bytes      Read register by register instead of in blocks.
  -h --help    Show this help text.
  --version    Show version.
";

fn parse_address(arg: &str) -> Option<u16> {
    let arg = arg.trim();
    match arg.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => arg.parse().ok(),
    }
}

fn dump(path: &str, address: u16, force: bool, pec: bool, bytes: bool) -> Result<()> {
    let mut i2c = I2cConfig::new()
        .address(address)
        .force(force)
        .pec(pec)
        .timeout(Duration::from_millis(100))
        .open(path)?;

    let mut registers = [0u8; 256];
    if bytes {
        for (register, value) in registers.iter_mut().enumerate() {
            *value = i2c.smbus_read_byte_data(register as u8)?;
        }
    } else {
        for (chunk, block) in registers.chunks_mut(32).enumerate() {
            let read = i2c.i2c_read_block_data((chunk * 32) as u8, block)?;
            if read < block.len() {
                log::warn!("short block read at {:#04x}: {} bytes", chunk * 32, read);
            }
        }
    }

    println!("     0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f");
    for (row, line) in registers.chunks(16).enumerate() {
        let hex: String = line.iter().map(|b| format!(" {:02x}", b)).collect();
        println!("{:02x}:{}", row * 16, hex);
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn main() {}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn main() {
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")
        .and_then(|logger| logger.start())
        .ok();

    let args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).parse())
        .unwrap_or_else(|e| e.exit());
    let path = args.get_str("<device>");
    let address = match parse_address(args.get_str("<address>")) {
        Some(address) => address,
        None => {
            eprintln!("Invalid address {}", args.get_str("<address>"));
            std::process::exit(2);
        }
    };

    if let Err(e) = dump(
        path,
        address,
        args.get_bool("--force"),
        args.get_bool("--pec"),
        args.get_bool("--bytes"),
    ) {
        eprintln!("Error dumping {:#04x} on {}: {}", address, path, e);
        std::process::exit(1);
    }
}
