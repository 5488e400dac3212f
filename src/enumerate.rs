// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! I2C adapter enumeration via [udev].

use std::fs::File;
use std::io;
use std::path::Path;
use std::vec;

use log::debug;

use crate::error::{Error, Result};
use crate::linux::I2c;

/// Enumerates all available i2c devices on the system.
pub struct Enumerator {
    inner: udev::Enumerator,
}

impl Enumerator {
    /// Create a new enumerator for available i2c devices.
    pub fn new() -> Result<Self> {
        let en = udev::Enumerator::new()?;
        Self::with_udev_enumerator(en)
    }

    /// Manually construct a new enumerator.
    ///
    /// The enumerator is restricted to the `i2c-dev` subsystem; other
    /// matches already configured on it still apply.
    pub fn with_udev_enumerator(mut inner: udev::Enumerator) -> Result<Self> {
        inner.match_subsystem("i2c-dev")?;
        Ok(Enumerator { inner })
    }

    /// Scan for i2c devices.
    pub fn iter(&mut self) -> Result<DeviceIterator> {
        let devices: Vec<_> = self
            .inner
            .scan_devices()?
            .map(EnumeratedDevice::new)
            .collect();
        debug!("udev reported {} i2c-dev adapters", devices.len());
        Ok(DeviceIterator {
            inner: devices.into_iter(),
        })
    }

    /// Scan for i2c devices, consuming the enumerator.
    pub fn into_iter(mut self) -> Result<DeviceIterator> {
        self.iter()
    }

    /// Retrieve the inner [udev::Enumerator].
    pub fn into_inner(self) -> udev::Enumerator {
        self.inner
    }
}

/// An iterator over enumerated i2c devices.
///
/// Use [Enumerator::iter] to construct this.
pub struct DeviceIterator {
    inner: vec::IntoIter<EnumeratedDevice>,
}

impl Iterator for DeviceIterator {
    type Item = EnumeratedDevice;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An enumerated i2c device.
pub struct EnumeratedDevice {
    device: udev::Device,
}

impl EnumeratedDevice {
    /// Manually construct an enumerated i2c device.
    pub fn new(device: udev::Device) -> Self {
        Self { device }
    }

    /// I2c device information.
    pub fn device(&self) -> &udev::Device {
        &self.device
    }

    /// The path to the device node of the i2c device, if it exists.
    pub fn path(&self) -> Option<&Path> {
        self.device.devnode()
    }

    /// The adapter number `N` of `i2c-N`, if the name follows that pattern.
    pub fn bus_number(&self) -> Option<u32> {
        self.device
            .sysname()
            .to_str()
            .and_then(parse_bus_number)
    }

    /// Open a new handle to the i2c device.
    pub fn open(&self) -> Result<I2c<File>> {
        let path = self.path().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "i2c device missing devnode path",
            ))
        })?;
        I2c::from_path(path)
    }
}

fn parse_bus_number(sysname: &str) -> Option<u32> {
    sysname.strip_prefix("i2c-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_bus_number;

    #[test]
    fn bus_numbers_come_from_the_sysname() {
        assert_eq!(parse_bus_number("i2c-0"), Some(0));
        assert_eq!(parse_bus_number("i2c-17"), Some(17));
        assert_eq!(parse_bus_number("i2c-x"), None);
        assert_eq!(parse_bus_number("spidev0.0"), None);
    }
}
