// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Bus-generic I2C and SMBus traits
//!
//! Drivers written against these traits work with both a real
//! [`I2c`](crate::I2c) adapter and the in-memory
//! [`MockI2c`](crate::mock::MockI2c).

use crate::message::{Message, ReadFlags, WriteFlags};

/// Interface to an I2C bus from the master side
pub trait Master {
    /// Error produced by bus operations
    type Error;
}

/// A bus that can select the slave device addressed by later operations
pub trait Address: Master {
    /// Set the slave address used by subsequent commands
    ///
    /// `tenbit` selects 10-bit addressing.
    fn set_slave_address(&mut self, addr: u16, tenbit: bool) -> Result<(), Self::Error>;
}

/// Plain reads and writes to the currently addressed slave
pub trait RawIo: Master {
    /// Read data from the device to fill the provided slice
    ///
    /// Returns the number of bytes read.
    fn i2c_read(&mut self, value: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write the provided buffer to the device
    fn i2c_write(&mut self, value: &[u8]) -> Result<(), Self::Error>;
}

/// SMBus 1.x transactions
pub trait Smbus: Master {
    /// This sends a single bit to the device, at the place of the Rd/Wr bit
    ///
    /// `true` is a read.
    fn smbus_write_quick(&mut self, value: bool) -> Result<(), Self::Error>;

    /// Read a single byte from a device, without specifying a device register
    ///
    /// Some devices are so simple that this interface is enough; for
    /// others, it is a shorthand if you want to read the same register as in
    /// the previous SMBus command.
    fn smbus_read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Write a single byte to a device, without specifying a device register
    ///
    /// This is the opposite operation as smbus_read_byte.  As with read_byte,
    /// no register is specified.
    fn smbus_write_byte(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Read a single byte from a device, from a designated register
    ///
    /// The register is specified through the Comm byte.
    fn smbus_read_byte_data(&mut self, command: u8) -> Result<u8, Self::Error>;

    /// Write a single byte to a specific register on a device
    ///
    /// The register is specified through the Comm byte.
    fn smbus_write_byte_data(&mut self, command: u8, value: u8) -> Result<(), Self::Error>;

    /// Read 2 bytes from a given register on a device
    fn smbus_read_word_data(&mut self, command: u8) -> Result<u16, Self::Error>;

    /// Write 2 bytes to a given register on a device
    fn smbus_write_word_data(&mut self, command: u8, value: u16) -> Result<(), Self::Error>;

    /// Select a register, send 16 bits of data to it, and read 16 bits of data
    fn smbus_process_call(&mut self, command: u8, value: u16) -> Result<u16, Self::Error>;

    /// Read a block of up to 32 bytes from a device
    ///
    /// The actual number of bytes available to read is returned in the count
    /// byte, and is the value returned here.
    fn smbus_read_block_data(
        &mut self,
        command: u8,
        value: &mut [u8],
    ) -> Result<usize, Self::Error>;

    /// Write a block of up to 32 bytes to a device
    ///
    /// The amount of data is sent ahead of it in the Count byte.
    fn smbus_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<(), Self::Error>;
}

/// SMBus 2.0 additions
pub trait Smbus20: Smbus {
    /// Select a register, send 1 to 31 bytes of data to it, and read
    /// 1 to 31 bytes of data back
    fn smbus_process_call_block(
        &mut self,
        command: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<usize, Self::Error>;
}

/// SMBus Packet Error Checking
pub trait SmbusPec: Smbus {
    /// Enable or disable PEC for subsequent SMBus transactions
    fn smbus_set_pec(&mut self, pec: bool) -> Result<(), Self::Error>;
}

/// Register-addressed block transfers without a count byte
pub trait BlockTransfer: Master {
    /// Read `value.len()` bytes starting at a register
    fn i2c_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `value` starting at a register
    fn i2c_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<(), Self::Error>;
}

/// Combined transfers separated by repeated START conditions
pub trait BulkTransfer: Master {
    /// The message flags this bus honours
    fn i2c_transfer_support(&mut self) -> Result<(ReadFlags, WriteFlags), Self::Error>;

    /// Execute a sequence of messages as a single transaction
    fn i2c_transfer(&mut self, messages: &mut [Message]) -> Result<(), Self::Error>;
}
