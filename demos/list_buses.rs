// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Lists the I2C adapters udev knows about and what they can do

extern crate docopt;
extern crate flexi_logger;
extern crate i2c_linux;

use docopt::Docopt;
use i2c_linux::Enumerator;
use std::env::args;

const USAGE: &str = "
List I2C adapters and their functionality.

Usage:
  list_buses
  list_buses (-h | --help)

Options:
  -h --help    Show this help text.
";

fn main() {
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")
        .and_then(|logger| logger.start())
        .ok();

    let _args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).parse())
        .unwrap_or_else(|e| e.exit());

    let devices = match Enumerator::new().and_then(Enumerator::into_iter) {
        Ok(devices) => devices,
        Err(e) => {
            eprintln!("Could not enumerate i2c adapters: {}", e);
            std::process::exit(1);
        }
    };

    for device in devices {
        let path = match device.path() {
            Some(path) => path.display().to_string(),
            None => continue,
        };
        let bus = device
            .bus_number()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        match device.open().and_then(|i2c| i2c.i2c_functionality()) {
            Ok(func) => println!("i2c-{}\t{}\t{:?}", bus, path, func),
            Err(e) => println!("i2c-{}\t{}\t({})", bus, path, e),
        }
    }
}
