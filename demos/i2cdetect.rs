// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Scans a bus for responding devices, in the style of i2c-tools' i2cdetect

extern crate docopt;
extern crate flexi_logger;
extern crate i2c_linux;

use docopt::Docopt;
use i2c_linux::{Error, Functionality, I2c, ReadWrite};
use nix::errno::Errno;
use std::env::args;
use std::fs::File;

const USAGE: &str = "
Probe an I2C bus for devices.

Addresses 0x30-0x37 and 0x50-0x5f are probed with an SMBus receive byte, as
a quick write can corrupt EEPROMs; all others with an SMBus quick write.

Usage:
  i2cdetect <device>
  i2cdetect (-h | --help)
  i2cdetect --version

Options:
  -h --help    Show this help text.
  --version    Show version.
";

enum Probe {
    Found,
    Busy,
    Absent,
}

fn probe(i2c: &mut I2c<File>, address: u16, func: Functionality) -> Probe {
    match i2c.smbus_set_slave_address(address, false) {
        Err(Error::Ioctl {
            source: Errno::EBUSY,
            ..
        }) => return Probe::Busy,
        Err(_) => return Probe::Absent,
        Ok(()) => (),
    }

    let use_read = (0x30..=0x37).contains(&address)
        || (0x50..=0x5f).contains(&address)
        || !func.contains(Functionality::SMBUS_QUICK);
    let res = if use_read {
        i2c.smbus_read_byte().map(drop)
    } else {
        i2c.smbus_write_quick(ReadWrite::Write)
    };
    match res {
        Ok(()) => Probe::Found,
        Err(_) => Probe::Absent,
    }
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

    let mut i2c = match I2c::from_path(path) {
        Ok(i2c) => i2c,
        Err(e) => {
            eprintln!("Error opening I2C bus {}: {}", path, e);
            std::process::exit(1);
        }
    };
    let func = match i2c.i2c_functionality() {
        Ok(func) => func,
        Err(e) => {
            eprintln!("Could not get the adapter functionality: {}", e);
            std::process::exit(1);
        }
    };
    if !func.intersects(Functionality::SMBUS_QUICK | Functionality::SMBUS_READ_BYTE) {
        eprintln!("Adapter supports neither quick write nor receive byte");
        std::process::exit(1);
    }

    println!("     0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f");
    for row in (0..0x80u16).step_by(16) {
        let mut line = format!("{:02x}:", row);
        for address in row..row + 16 {
            let cell = if !(0x03..=0x77).contains(&address) {
                "   ".to_string()
            } else {
                match probe(&mut i2c, address, func) {
                    Probe::Found => format!(" {:02x}", address),
                    Probe::Busy => " UU".to_string(),
                    Probe::Absent => " --".to_string(),
                }
            };
            line.push_str(&cell);
        }
        println!("{}", line);
    }
}
