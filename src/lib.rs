// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! # i2c-linux
//!
//! A safe interface to the Linux I2C and SMBus userspace subsystem. The API
//! wraps the kernel interface for interacting with i2c in userspace:
//! https://www.kernel.org/doc/Documentation/i2c/dev-interface
//!
//! # Example
//!
//! ```rust,no_run
//! use i2c_linux::I2c;
//!
//! # fn main() -> i2c_linux::Result<()> {
//! let mut i2c = I2c::from_path("/dev/i2c-0")?;
//! i2c.smbus_set_slave_address(0x50, false)?;
//! let data = i2c.smbus_read_byte()?;
//! println!("Read I2C data: {}", data);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! - `udev` must be enabled to use `Enumerator`.

#[macro_use]
extern crate nix;
#[macro_use]
extern crate bitflags;

mod config;
pub mod core;
mod error;
pub mod ffi;
mod linux;
mod message;
pub mod mock;

#[cfg(feature = "udev")]
mod enumerate;

pub use crate::config::I2cConfig;
pub use crate::error::{Error, Result};
pub use crate::ffi::{Functionality, ReadWrite};
pub use crate::linux::I2c;
pub use crate::message::{transfer_flags, Message, ReadFlags, WriteFlags};

#[cfg(feature = "udev")]
pub use crate::enumerate::{DeviceIterator, EnumeratedDevice, Enumerator};
