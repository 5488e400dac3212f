// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp;
use std::convert::TryFrom;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem;
use std::os::unix::prelude::*;
use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::core;
use crate::error::{Error, Result};
use crate::ffi::{self, Functionality, ReadWrite, I2C_SMBUS_BLOCK_MAX};
use crate::message::{self, Message, ReadFlags, WriteFlags};

/// A safe wrapper around an I2C device.
///
/// The kernel exposes one device (e.g. `/dev/i2c-1`) per I2C bus that is
/// available to userspace. A single bus may have multiple devices on it;
/// SMBus commands and plain reads/writes go to the slave selected with
/// [`smbus_set_slave_address`](I2c::smbus_set_slave_address), while
/// [`i2c_transfer`](I2c::i2c_transfer) addresses each message separately.
#[derive(Debug)]
pub struct I2c<I> {
    inner: I,
    address: Option<u16>,
    address_10bit: bool,
    functionality: Option<Functionality>,
}

impl I2c<File> {
    /// Open an I2C device
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<I> I2c<I> {
    /// Creates a new I2C handle with the given file descriptor
    pub fn new(device: I) -> Self {
        I2c {
            inner: device,
            address: None,
            address_10bit: false,
            functionality: None,
        }
    }

    /// Consumes the I2C handle to return the inner file descriptor.
    pub fn into_inner(self) -> I {
        self.inner
    }

    /// Borrows the inner file descriptor.
    pub fn inner_ref(&self) -> &I {
        &self.inner
    }

    /// Mutably borrows the inner file descriptor.
    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.inner
    }

    /// The slave address last selected, if any.
    pub fn address(&self) -> Option<u16> {
        self.address
    }
}

impl<I: AsRawFd> AsRawFd for I2c<I> {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl<I: IntoRawFd> IntoRawFd for I2c<I> {
    fn into_raw_fd(self) -> RawFd {
        self.inner.into_raw_fd()
    }
}

impl FromRawFd for I2c<File> {
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self::new(File::from_raw_fd(fd))
    }
}

/// How a register-addressed block transfer reaches the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockStrategy {
    /// The adapter's native SMBus I2C-block command
    Smbus,
    /// Emulated with `I2C_RDWR` messages to the selected slave
    Transfer {
        address: u16,
        tenbit: bool,
        no_start: bool,
    },
}

/// Pick between the SMBus command and `I2C_RDWR` emulation
///
/// Emulation is used when the functionality is known, the adapter lacks
/// `native` or the block is too long for SMBus, plain I2C is available, and
/// a slave address has been selected.
pub(crate) fn block_strategy(
    func: Option<Functionality>,
    native: Functionality,
    len: usize,
    address: Option<u16>,
    tenbit: bool,
) -> BlockStrategy {
    match (func, address) {
        (Some(func), Some(address))
            if (!func.contains(native) || len > I2C_SMBUS_BLOCK_MAX)
                && func.contains(Functionality::I2C) =>
        {
            BlockStrategy::Transfer {
                address,
                tenbit,
                no_start: func.contains(Functionality::NO_START),
            }
        }
        _ => BlockStrategy::Smbus,
    }
}

/// Convert a timeout to the kernel's units of 10ms, rounding up
pub(crate) fn timeout_units(duration: Duration) -> Result<libc::c_int> {
    const UNIT_NANOS: u128 = 10_000_000;
    let units = (duration.as_nanos() + UNIT_NANOS - 1) / UNIT_NANOS;
    libc::c_int::try_from(units).map_err(|_| Error::InvalidArgument("i2c timeout is too long"))
}

/// Read a register block as a write of `command` and a repeated START read
pub(crate) fn transfer_block_read<T: core::BulkTransfer>(
    bus: &mut T,
    address: u16,
    tenbit: bool,
    command: u8,
    value: &mut [u8],
) -> std::result::Result<usize, T::Error> {
    let command = [command];
    let mut msgs = [
        Message::Write {
            address,
            data: &command,
            flags: WriteFlags::addressing(tenbit),
        },
        Message::Read {
            address,
            data: value,
            flags: ReadFlags::addressing(tenbit),
        },
    ];
    bus.i2c_transfer(&mut msgs)?;
    Ok(msgs[1].len())
}

/// Write a register block, chaining the data with `NO_START` when allowed
pub(crate) fn transfer_block_write<T: core::BulkTransfer>(
    bus: &mut T,
    address: u16,
    tenbit: bool,
    no_start: bool,
    command: u8,
    value: &[u8],
) -> std::result::Result<(), T::Error> {
    let flags = WriteFlags::addressing(tenbit);
    if no_start {
        let command = [command];
        bus.i2c_transfer(&mut [
            Message::Write {
                address,
                data: &command,
                flags,
            },
            Message::Write {
                address,
                data: value,
                flags: flags | WriteFlags::NO_START,
            },
        ])
    } else {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.push(command);
        data.extend_from_slice(value);
        bus.i2c_transfer(&mut [Message::Write {
            address,
            data: &data,
            flags,
        }])
    }
}

fn check_block(len: usize, max: usize) -> Result<()> {
    if len > max {
        Err(Error::BlockTooLarge { len, max })
    } else {
        Ok(())
    }
}

impl<I: AsRawFd> I2c<I> {
    fn update_functionality(&mut self) -> Option<Functionality> {
        if let Some(func) = self.functionality {
            return Some(func);
        }
        match self.i2c_functionality() {
            Ok(func) => {
                debug!("i2c adapter functionality: {:?}", func);
                self.functionality = Some(func);
                Some(func)
            }
            Err(e) => {
                debug!("i2c functionality unavailable: {}", e);
                None
            }
        }
    }

    /// Sets the number of times to retry communication before failing.
    pub fn i2c_set_retries(&self, value: usize) -> Result<()> {
        let value = libc::c_int::try_from(value)
            .map_err(|_| Error::InvalidArgument("i2c retry count is too large"))?;
        ffi::i2c_set_retries(self.as_raw_fd(), value).map_err(Error::ioctl("I2C_RETRIES"))
    }

    /// Sets a timeout for I2C operations
    ///
    /// The kernel counts in units of 10ms; the duration is rounded up.
    pub fn i2c_set_timeout(&self, duration: Duration) -> Result<()> {
        let units = timeout_units(duration)?;
        ffi::i2c_set_timeout(self.as_raw_fd(), units).map_err(Error::ioctl("I2C_TIMEOUT"))
    }

    /// Set the slave address to communicate with.
    pub fn smbus_set_slave_address(&mut self, address: u16, tenbit: bool) -> Result<()> {
        self.set_slave_address_inner(address, tenbit, false)
    }

    /// Set the slave address even if a kernel driver has claimed it.
    ///
    /// This is how tools like `i2cget -f` talk to devices that are already
    /// bound, and can confuse that driver.
    pub fn smbus_set_slave_address_force(&mut self, address: u16, tenbit: bool) -> Result<()> {
        self.set_slave_address_inner(address, tenbit, true)
    }

    fn set_slave_address_inner(&mut self, address: u16, tenbit: bool, force: bool) -> Result<()> {
        if let Some(func) = self.update_functionality() {
            if func.contains(Functionality::TENBIT_ADDR) || tenbit {
                ffi::i2c_set_slave_address_10bit(self.as_raw_fd(), tenbit)
                    .map_err(Error::ioctl("I2C_TENBIT"))?;
            }
        }

        let op = if force { "I2C_SLAVE_FORCE" } else { "I2C_SLAVE" };
        ffi::i2c_set_slave_address(self.as_raw_fd(), address, force).map_err(Error::ioctl(op))?;

        self.address = Some(address);
        self.address_10bit = tenbit;
        Ok(())
    }

    /// Enable or disable SMBus Packet Error Checking.
    pub fn smbus_set_pec(&self, pec: bool) -> Result<()> {
        ffi::i2c_set_smbus_pec(self.as_raw_fd(), pec).map_err(Error::ioctl("I2C_PEC"))
    }

    /// Retrieve the capabilities of the I2C device. These should be checked
    /// before attempting to use certain SMBus commands or I2C flags.
    pub fn i2c_functionality(&self) -> Result<Functionality> {
        ffi::i2c_get_functionality(self.as_raw_fd()).map_err(Error::ioctl("I2C_FUNCS"))
    }

    /// `i2c_transfer` capabilities of the I2C device. These should be checked
    /// before attempting to use any of the protocol mangling flags.
    pub fn i2c_transfer_flags(&self) -> Result<(ReadFlags, WriteFlags)> {
        self.i2c_functionality().map(message::transfer_flags)
    }

    /// Executes a queue of I2C transfers, separated by repeat START conditions.
    /// Data buffers are truncated to the actual read length on completion.
    ///
    /// At most 42 messages fit in one call. See the `I2C_RDWR` ioctl for
    /// more information.
    pub fn i2c_transfer(&mut self, messages: &mut [Message]) -> Result<()> {
        if messages.len() > ffi::I2C_RDWR_IOCTL_MAX_MSGS {
            return Err(Error::TooManyMessages {
                count: messages.len(),
                max: ffi::I2C_RDWR_IOCTL_MAX_MSGS,
            });
        }

        let mut raw = Vec::with_capacity(messages.len());
        for msg in messages.iter_mut() {
            let len = u16::try_from(msg.len())
                .map_err(|_| Error::InvalidArgument("i2c message is longer than 65535 bytes"))?;
            let flags = msg.raw_flags().bits();
            raw.push(match *msg {
                Message::Read {
                    address,
                    ref mut data,
                    ..
                } => ffi::i2c_msg {
                    addr: address,
                    flags,
                    len,
                    buf: data.as_mut_ptr(),
                },
                Message::Write { address, data, .. } => ffi::i2c_msg {
                    addr: address,
                    flags,
                    len,
                    buf: data.as_ptr() as *mut u8,
                },
            });
        }

        // the kernel only writes through the buffers of read messages
        unsafe { ffi::i2c_rdwr(self.as_raw_fd(), &mut raw) }.map_err(Error::ioctl("I2C_RDWR"))?;

        for (raw, msg) in raw.iter().zip(messages.iter_mut()) {
            if let Message::Read { ref mut data, .. } = *msg {
                let len = cmp::min(raw.len as usize, data.len());
                let buf = mem::take(data);
                *data = &mut buf[..len];
            }
        }

        Ok(())
    }

    /// Sends a single bit to the device, in the place of the Rd/Wr address bit.
    pub fn smbus_write_quick(&mut self, value: ReadWrite) -> Result<()> {
        ffi::i2c_smbus_write_quick(self.as_raw_fd(), value).map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Reads a single byte from a device without specifying a register.
    ///
    /// Some devices are so simple that this interface is enough; for others, it
    /// is a shorthand if you want to read the same register as in the previous
    /// SMBus command.
    pub fn smbus_read_byte(&mut self) -> Result<u8> {
        ffi::i2c_smbus_read_byte(self.as_raw_fd()).map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Sends a single byte to a device.
    pub fn smbus_write_byte(&mut self, value: u8) -> Result<()> {
        ffi::i2c_smbus_write_byte(self.as_raw_fd(), value).map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Reads a single byte from a device from the designated register.
    pub fn smbus_read_byte_data(&mut self, command: u8) -> Result<u8> {
        ffi::i2c_smbus_read_byte_data(self.as_raw_fd(), command)
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Writes a single byte to a device to the designated register.
    pub fn smbus_write_byte_data(&mut self, command: u8, value: u8) -> Result<()> {
        ffi::i2c_smbus_write_byte_data(self.as_raw_fd(), command, value)
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Reads a 16-bit word from the device register.
    pub fn smbus_read_word_data(&mut self, command: u8) -> Result<u16> {
        ffi::i2c_smbus_read_word_data(self.as_raw_fd(), command)
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Writes a 16-bit word to the device register.
    pub fn smbus_write_word_data(&mut self, command: u8, value: u16) -> Result<()> {
        ffi::i2c_smbus_write_word_data(self.as_raw_fd(), command, value)
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Selects a device register, sends a 16-bit word to it, and read 16-bits
    /// of data in return.
    pub fn smbus_process_call(&mut self, command: u8, value: u16) -> Result<u16> {
        ffi::i2c_smbus_process_call(self.as_raw_fd(), command, value)
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Read up to 32 bytes from the designated device register.
    ///
    /// Returns the amount of data read.
    pub fn smbus_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize> {
        let len = cmp::min(value.len(), I2C_SMBUS_BLOCK_MAX);
        ffi::i2c_smbus_read_block_data(self.as_raw_fd(), command, &mut value[..len])
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Write up to 32 bytes to the designated device register.
    pub fn smbus_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<()> {
        check_block(value.len(), I2C_SMBUS_BLOCK_MAX)?;
        ffi::i2c_smbus_write_block_data(self.as_raw_fd(), command, value)
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Sends up to 31 bytes of data to the designated device register, and reads
    /// up to 31 bytes in return.
    ///
    /// This was introduced in SMBus 2.0
    pub fn smbus_block_process_call(
        &mut self,
        command: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<usize> {
        check_block(write.len(), ffi::I2C_SMBUS_BLOCK_PROC_CALL_MAX)?;
        let read_len = cmp::min(read.len(), I2C_SMBUS_BLOCK_MAX);
        ffi::i2c_smbus_block_process_call(self.as_raw_fd(), command, write, &mut read[..read_len])
            .map_err(Error::ioctl("I2C_SMBUS"))
    }

    /// Reads a block of bytes from the designated device register.
    ///
    /// Unlike smbus_read_block_data this does not receive a data length. The
    /// SMBus command is limited to 32 bytes; when the adapter lacks it, or
    /// more data is requested, and plain I2C is available, the read is issued
    /// as a write of the register followed by a repeated START read.
    /// `write()`+`read()` may also be an option, though will produce an I2C
    /// STOP condition between the transfers, which may be undesirable.
    pub fn i2c_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize> {
        let func = self.update_functionality();
        let strategy = block_strategy(
            func,
            Functionality::SMBUS_READ_I2C_BLOCK,
            value.len(),
            self.address,
            self.address_10bit,
        );

        match strategy {
            BlockStrategy::Transfer {
                address, tenbit, ..
            } => {
                debug!(
                    "emulating i2c block read of {} bytes from {:#04x}",
                    value.len(),
                    address
                );
                transfer_block_read(self, address, tenbit, command, value)
            }
            BlockStrategy::Smbus => {
                let len = cmp::min(value.len(), I2C_SMBUS_BLOCK_MAX);
                ffi::i2c_smbus_read_i2c_block_data(self.as_raw_fd(), command, &mut value[..len])
                    .map_err(Error::ioctl("I2C_SMBUS"))
            }
        }
    }

    /// Writes a block of bytes from the designated device register.
    ///
    /// Unlike smbus_write_block_data this does not transfer the data length.
    /// The SMBus command is limited to 32 bytes; longer blocks are sent with
    /// `I2C_RDWR` when the adapter supports plain I2C and a slave address
    /// has been selected.
    pub fn i2c_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<()> {
        let func = self.update_functionality();
        let strategy = block_strategy(
            func,
            Functionality::SMBUS_WRITE_I2C_BLOCK,
            value.len(),
            self.address,
            self.address_10bit,
        );

        match strategy {
            BlockStrategy::Transfer {
                address,
                tenbit,
                no_start,
            } => {
                debug!(
                    "emulating i2c block write of {} bytes to {:#04x}",
                    value.len(),
                    address
                );
                transfer_block_write(self, address, tenbit, no_start, command, value)
            }
            BlockStrategy::Smbus => {
                check_block(value.len(), I2C_SMBUS_BLOCK_MAX)?;
                ffi::i2c_smbus_write_i2c_block_data(self.as_raw_fd(), command, value)
                    .map_err(Error::ioctl("I2C_SMBUS"))
            }
        }
    }
}

impl<I: Read> Read for I2c<I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<I: Write> Write for I2c<I> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<I: AsRawFd> core::Master for I2c<I> {
    type Error = Error;
}

impl<I: AsRawFd> core::Address for I2c<I> {
    fn set_slave_address(&mut self, addr: u16, tenbit: bool) -> Result<()> {
        I2c::smbus_set_slave_address(self, addr, tenbit)
    }
}

impl<I: AsRawFd + Read + Write> core::RawIo for I2c<I> {
    fn i2c_read(&mut self, value: &mut [u8]) -> Result<usize> {
        Ok(Read::read(self, value)?)
    }

    fn i2c_write(&mut self, value: &[u8]) -> Result<()> {
        Ok(Write::write_all(self, value)?)
    }
}

impl<I: AsRawFd> core::Smbus for I2c<I> {
    fn smbus_write_quick(&mut self, value: bool) -> Result<()> {
        let value = if value { ReadWrite::Read } else { ReadWrite::Write };
        I2c::smbus_write_quick(self, value)
    }

    fn smbus_read_byte(&mut self) -> Result<u8> {
        I2c::smbus_read_byte(self)
    }

    fn smbus_write_byte(&mut self, value: u8) -> Result<()> {
        I2c::smbus_write_byte(self, value)
    }

    fn smbus_read_byte_data(&mut self, command: u8) -> Result<u8> {
        I2c::smbus_read_byte_data(self, command)
    }

    fn smbus_write_byte_data(&mut self, command: u8, value: u8) -> Result<()> {
        I2c::smbus_write_byte_data(self, command, value)
    }

    fn smbus_read_word_data(&mut self, command: u8) -> Result<u16> {
        I2c::smbus_read_word_data(self, command)
    }

    fn smbus_write_word_data(&mut self, command: u8, value: u16) -> Result<()> {
        I2c::smbus_write_word_data(self, command, value)
    }

    fn smbus_process_call(&mut self, command: u8, value: u16) -> Result<u16> {
        I2c::smbus_process_call(self, command, value)
    }

    fn smbus_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize> {
        I2c::smbus_read_block_data(self, command, value)
    }

    fn smbus_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<()> {
        I2c::smbus_write_block_data(self, command, value)
    }
}

impl<I: AsRawFd> core::Smbus20 for I2c<I> {
    fn smbus_process_call_block(
        &mut self,
        command: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<usize> {
        I2c::smbus_block_process_call(self, command, write, read)
    }
}

impl<I: AsRawFd> core::SmbusPec for I2c<I> {
    fn smbus_set_pec(&mut self, pec: bool) -> Result<()> {
        I2c::smbus_set_pec(self, pec)
    }
}

impl<I: AsRawFd> core::BlockTransfer for I2c<I> {
    fn i2c_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize> {
        I2c::i2c_read_block_data(self, command, value)
    }

    fn i2c_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<()> {
        I2c::i2c_write_block_data(self, command, value)
    }
}

impl<I: AsRawFd> core::BulkTransfer for I2c<I> {
    fn i2c_transfer_support(&mut self) -> Result<(ReadFlags, WriteFlags)> {
        I2c::i2c_transfer_flags(self)
    }

    fn i2c_transfer(&mut self, messages: &mut [Message]) -> Result<()> {
        I2c::i2c_transfer(self, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMBUS_ONLY: Functionality = Functionality::SMBUS_EMUL;

    #[test]
    fn native_block_commands_are_preferred() {
        let func = Functionality::I2C | SMBUS_ONLY;
        assert_eq!(
            block_strategy(Some(func), Functionality::SMBUS_READ_I2C_BLOCK, 16, Some(0x50), false),
            BlockStrategy::Smbus
        );
    }

    #[test]
    fn long_blocks_fall_back_to_transfers() {
        let func = Functionality::I2C | Functionality::NO_START | SMBUS_ONLY;
        assert_eq!(
            block_strategy(Some(func), Functionality::SMBUS_WRITE_I2C_BLOCK, 64, Some(0x50), true),
            BlockStrategy::Transfer {
                address: 0x50,
                tenbit: true,
                no_start: true,
            }
        );
    }

    #[test]
    fn missing_smbus_block_support_falls_back() {
        let func = Functionality::I2C;
        assert_eq!(
            block_strategy(Some(func), Functionality::SMBUS_READ_I2C_BLOCK, 4, Some(0x20), false),
            BlockStrategy::Transfer {
                address: 0x20,
                tenbit: false,
                no_start: false,
            }
        );
    }

    #[test]
    fn emulation_needs_plain_i2c_and_an_address() {
        let native = Functionality::SMBUS_READ_I2C_BLOCK;
        assert_eq!(
            block_strategy(Some(SMBUS_ONLY), native, 64, Some(0x50), false),
            BlockStrategy::Smbus
        );
        assert_eq!(
            block_strategy(Some(Functionality::I2C), native, 64, None, false),
            BlockStrategy::Smbus
        );
        assert_eq!(
            block_strategy(None, native, 64, Some(0x50), false),
            BlockStrategy::Smbus
        );
    }

    /// A bus that records each message and fills reads with a pattern
    #[derive(Default)]
    struct Recorder {
        sent: Vec<(u16, bool, ffi::Flags, Vec<u8>)>,
    }

    impl core::Master for Recorder {
        type Error = Error;
    }

    impl core::BulkTransfer for Recorder {
        fn i2c_transfer_support(&mut self) -> Result<(ReadFlags, WriteFlags)> {
            Ok((ReadFlags::all(), WriteFlags::all()))
        }

        fn i2c_transfer(&mut self, messages: &mut [Message]) -> Result<()> {
            for msg in messages.iter_mut() {
                let flags = msg.raw_flags();
                match *msg {
                    Message::Read {
                        address,
                        ref mut data,
                        ..
                    } => {
                        for (i, byte) in data.iter_mut().enumerate() {
                            *byte = 0xa0 + i as u8;
                        }
                        self.sent.push((address, true, flags, Vec::new()));
                    }
                    Message::Write { address, data, .. } => {
                        self.sent.push((address, false, flags, data.to_vec()));
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn emulated_reads_write_the_register_then_read() {
        let mut bus = Recorder::default();
        let mut buf = [0u8; 3];
        assert_eq!(transfer_block_read(&mut bus, 0x2a5, true, 0x40, &mut buf).unwrap(), 3);
        assert_eq!(buf, [0xa0, 0xa1, 0xa2]);
        assert_eq!(
            bus.sent,
            vec![
                (0x2a5, false, ffi::Flags::TEN, vec![0x40]),
                (0x2a5, true, ffi::Flags::TEN | ffi::Flags::RD, vec![]),
            ]
        );
    }

    #[test]
    fn emulated_writes_chain_with_no_start() {
        let mut bus = Recorder::default();
        transfer_block_write(&mut bus, 0x50, false, true, 0x10, &[1, 2, 3]).unwrap();
        assert_eq!(
            bus.sent,
            vec![
                (0x50, false, ffi::Flags::empty(), vec![0x10]),
                (0x50, false, ffi::Flags::NOSTART, vec![1, 2, 3]),
            ]
        );
    }

    #[test]
    fn emulated_writes_prefix_the_register_without_no_start() {
        let mut bus = Recorder::default();
        transfer_block_write(&mut bus, 0x50, false, false, 0x10, &[1, 2, 3]).unwrap();
        assert_eq!(
            bus.sent,
            vec![(0x50, false, ffi::Flags::empty(), vec![0x10, 1, 2, 3])]
        );
    }

    #[test]
    fn timeouts_round_up_to_ten_milliseconds() {
        assert_eq!(timeout_units(Duration::from_millis(0)).unwrap(), 0);
        assert_eq!(timeout_units(Duration::from_micros(1)).unwrap(), 1);
        assert_eq!(timeout_units(Duration::from_millis(10)).unwrap(), 1);
        assert_eq!(timeout_units(Duration::from_millis(15)).unwrap(), 2);
        assert_eq!(timeout_units(Duration::from_secs(1)).unwrap(), 100);
    }

    #[test]
    fn absurd_timeouts_are_rejected() {
        match timeout_units(Duration::from_secs(u64::MAX)) {
            Err(Error::InvalidArgument(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn oversized_blocks_are_rejected() {
        assert!(check_block(32, I2C_SMBUS_BLOCK_MAX).is_ok());
        match check_block(33, I2C_SMBUS_BLOCK_MAX) {
            Err(Error::BlockTooLarge { len: 33, max: 32 }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fresh_handles_have_no_address() {
        let i2c = I2c::new(tempfile::tempfile().unwrap());
        assert_eq!(i2c.address(), None);
    }
}
