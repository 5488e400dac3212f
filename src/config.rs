// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::error::Result;
use crate::linux::I2c;

/// Settings applied to an I2C handle when it is opened
///
/// ```rust,no_run
/// use std::time::Duration;
/// use i2c_linux::I2cConfig;
///
/// # fn main() -> i2c_linux::Result<()> {
/// let mut i2c = I2cConfig::new()
///     .address(0x50)
///     .timeout(Duration::from_millis(100))
///     .retries(3)
///     .open("/dev/i2c-1")?;
/// let id = i2c.smbus_read_byte_data(0x00)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct I2cConfig {
    /// Number of times the adapter retries a transfer
    pub retries: Option<usize>,
    /// Adapter timeout
    pub timeout: Option<Duration>,
    /// SMBus Packet Error Checking
    pub pec: Option<bool>,
    /// Slave address to select
    pub address: Option<u16>,
    /// Use 10-bit addressing for `address`
    pub tenbit: bool,
    /// Select `address` even if a kernel driver has claimed it
    pub force: bool,
}

impl I2cConfig {
    /// An empty configuration that leaves the adapter untouched
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the adapter retries a transfer before failing
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Adapter timeout, rounded up to the kernel's 10ms units
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable SMBus Packet Error Checking
    pub fn pec(mut self, pec: bool) -> Self {
        self.pec = Some(pec);
        self
    }

    /// Select this slave address after opening
    pub fn address(mut self, address: u16) -> Self {
        self.address = Some(address);
        self
    }

    /// Treat `address` as a 10-bit address
    pub fn tenbit(mut self, tenbit: bool) -> Self {
        self.tenbit = tenbit;
        self
    }

    /// Use `I2C_SLAVE_FORCE` so an address claimed by a driver can be selected
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Open the device at `path` and apply these settings to it
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<I2c<File>> {
        let mut i2c = I2c::from_path(path.as_ref())?;
        debug!("opened i2c adapter {}", path.as_ref().display());
        self.apply(&mut i2c)?;
        Ok(i2c)
    }

    /// Apply these settings to an open handle
    ///
    /// Retries and timeout go first so they cover the address selection.
    /// PEC is set last because the kernel tracks it per client.
    pub fn apply<I: AsRawFd>(&self, i2c: &mut I2c<I>) -> Result<()> {
        if let Some(retries) = self.retries {
            debug!("i2c retries: {}", retries);
            i2c.i2c_set_retries(retries)?;
        }
        if let Some(timeout) = self.timeout {
            debug!("i2c timeout: {:?}", timeout);
            i2c.i2c_set_timeout(timeout)?;
        }
        if let Some(address) = self.address {
            debug!(
                "i2c slave address: {:#04x} tenbit={} force={}",
                address, self.tenbit, self.force
            );
            if self.force {
                i2c.smbus_set_slave_address_force(address, self.tenbit)?;
            } else {
                i2c.smbus_set_slave_address(address, self.tenbit)?;
            }
        }
        if let Some(pec) = self.pec {
            debug!("smbus pec: {}", pec);
            i2c.smbus_set_pec(pec)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = I2cConfig::new()
            .retries(2)
            .timeout(Duration::from_millis(50))
            .pec(true)
            .address(0x3c)
            .tenbit(false)
            .force(true);
        assert_eq!(
            config,
            I2cConfig {
                retries: Some(2),
                timeout: Some(Duration::from_millis(50)),
                pec: Some(true),
                address: Some(0x3c),
                tenbit: false,
                force: true,
            }
        );
    }

    #[test]
    fn empty_config_touches_nothing() {
        // no ioctl is issued, so a regular file is an acceptable handle
        let mut i2c = I2c::new(tempfile::tempfile().unwrap());
        I2cConfig::new().apply(&mut i2c).unwrap();
        assert_eq!(i2c.address(), None);
    }

    #[test]
    fn settings_on_a_regular_file_fail_with_the_ioctl_name() {
        let mut i2c = I2c::new(tempfile::tempfile().unwrap());
        let err = I2cConfig::new().retries(1).apply(&mut i2c).unwrap_err();
        assert!(err.to_string().starts_with("I2C_RETRIES"), "{}", err);
    }

    #[test]
    fn opening_a_missing_device_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        match I2cConfig::new().open(dir.path().join("i2c-99")) {
            Err(crate::Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}
