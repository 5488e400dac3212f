// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Raw bindings to the kernel `i2c-dev` ioctl interface.
//!
//! Everything here mirrors `include/uapi/linux/i2c.h` and
//! `include/uapi/linux/i2c-dev.h`. The functions are thin wrappers that
//! return the kernel's errno untouched; validation of lengths and
//! addresses happens in [`I2c`](crate::I2c).

#![allow(non_camel_case_types)]

use std::cmp;
use std::os::unix::prelude::*;
use std::ptr;

use byteorder::{ByteOrder, NativeEndian};
use log::{trace, warn};

pub type I2CError = nix::Error;

bitflags! {
    /// Raw `i2c_msg` flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u16 {
        /// this is a ten bit chip address
        const TEN = 0x0010;
        /// read data, from slave to master
        const RD = 0x0001;
        /// if I2C_FUNC_PROTOCOL_MANGLING
        const STOP = 0x8000;
        /// if I2C_FUNC_NOSTART
        const NOSTART = 0x4000;
        /// if I2C_FUNC_PROTOCOL_MANGLING
        const REV_DIR_ADDR = 0x2000;
        /// if I2C_FUNC_PROTOCOL_MANGLING
        const IGNORE_NAK = 0x1000;
        /// if I2C_FUNC_PROTOCOL_MANGLING
        const NO_RD_ACK = 0x0800;
        /// length will be first received byte
        const RECV_LEN = 0x0400;
    }
}

/// An I2C transaction segment beginning with START, as seen by `I2C_RDWR`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct i2c_msg {
    /// slave address
    pub addr: u16,
    /// serialized `Flags`
    pub flags: u16,
    /// msg length
    pub len: u16,
    /// pointer to msg data
    pub buf: *mut u8,
}

bitflags! {
    /// To determine what functionality is present
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Functionality: u32 {
        /// Plain i2c-level commands (`I2C_RDWR`)
        const I2C = 0x0000_0001;
        /// Handles the 10-bit address extensions
        const TENBIT_ADDR = 0x0000_0002;
        /// I2C_M_IGNORE_NAK etc.
        const PROTOCOL_MANGLING = 0x0000_0004;
        const SMBUS_PEC = 0x0000_0008;
        /// I2C_M_NOSTART
        const NO_START = 0x0000_0010;
        const SLAVE = 0x0000_0020;
        /// SMBus 2.0
        const SMBUS_BLOCK_PROC_CALL = 0x0000_8000;
        const SMBUS_QUICK = 0x0001_0000;
        const SMBUS_READ_BYTE = 0x0002_0000;
        const SMBUS_WRITE_BYTE = 0x0004_0000;
        const SMBUS_READ_BYTE_DATA = 0x0008_0000;
        const SMBUS_WRITE_BYTE_DATA = 0x0010_0000;
        const SMBUS_READ_WORD_DATA = 0x0020_0000;
        const SMBUS_WRITE_WORD_DATA = 0x0040_0000;
        const SMBUS_PROC_CALL = 0x0080_0000;
        const SMBUS_READ_BLOCK_DATA = 0x0100_0000;
        const SMBUS_WRITE_BLOCK_DATA = 0x0200_0000;
        /// I2C-like block xfer
        const SMBUS_READ_I2C_BLOCK = 0x0400_0000;
        /// w/ 1-byte reg. addr.
        const SMBUS_WRITE_I2C_BLOCK = 0x0800_0000;
        const SMBUS_HOST_NOTIFY = 0x1000_0000;

        const SMBUS_BYTE = Self::SMBUS_READ_BYTE.bits() | Self::SMBUS_WRITE_BYTE.bits();
        const SMBUS_BYTE_DATA = Self::SMBUS_READ_BYTE_DATA.bits() | Self::SMBUS_WRITE_BYTE_DATA.bits();
        const SMBUS_WORD_DATA = Self::SMBUS_READ_WORD_DATA.bits() | Self::SMBUS_WRITE_WORD_DATA.bits();
        const SMBUS_BLOCK_DATA = Self::SMBUS_READ_BLOCK_DATA.bits() | Self::SMBUS_WRITE_BLOCK_DATA.bits();
        const SMBUS_I2C_BLOCK = Self::SMBUS_READ_I2C_BLOCK.bits() | Self::SMBUS_WRITE_I2C_BLOCK.bits();
        const SMBUS_EMUL = Self::SMBUS_QUICK.bits()
            | Self::SMBUS_BYTE.bits()
            | Self::SMBUS_BYTE_DATA.bits()
            | Self::SMBUS_WORD_DATA.bits()
            | Self::SMBUS_PROC_CALL.bits()
            | Self::SMBUS_WRITE_BLOCK_DATA.bits()
            | Self::SMBUS_I2C_BLOCK.bits()
            | Self::SMBUS_PEC.bits();
    }
}

/// As specified in SMBus standard
pub const I2C_SMBUS_BLOCK_MAX: usize = 32;

/// Largest payload of an SMBus 2.0 block process call
pub const I2C_SMBUS_BLOCK_PROC_CALL_MAX: usize = I2C_SMBUS_BLOCK_MAX - 1;

// union i2c_smbus_data {
//     __u8 byte;
//     __u16 word;
//     __u8 block[I2C_SMBUS_BLOCK_MAX + 2]; /* block[0] is used for length */
//                            /* and one more for user-space compatibility */
// };
//
// The block member is the largest, so it stands in for the whole union.
#[repr(C)]
pub struct i2c_smbus_data {
    pub block: [u8; I2C_SMBUS_BLOCK_MAX + 2],
}

impl i2c_smbus_data {
    pub fn empty() -> i2c_smbus_data {
        i2c_smbus_data {
            block: [0; I2C_SMBUS_BLOCK_MAX + 2],
        }
    }

    fn word(&self) -> u16 {
        NativeEndian::read_u16(&self.block[..2])
    }

    fn with_word(value: u16) -> i2c_smbus_data {
        let mut data = i2c_smbus_data::empty();
        NativeEndian::write_u16(&mut data.block[..2], value);
        data
    }

    /// Copy at most `max_size` bytes of `values` in as a counted block
    fn with_block(values: &[u8], max_size: usize) -> i2c_smbus_data {
        let mut data = i2c_smbus_data::empty();
        let len = cmp::min(values.len(), max_size);
        data.block[0] = len as u8;
        data.block[1..=len].copy_from_slice(&values[..len]);
        data
    }

    /// Copy the counted block out, returning the number of bytes stored
    fn read_block(&self, out: &mut [u8]) -> usize {
        let count = self.block[0] as usize;
        let len = cmp::min(cmp::min(count, I2C_SMBUS_BLOCK_MAX), out.len());
        if len < count {
            warn!("SMBus block of {} bytes truncated to {} bytes", count, len);
        }
        out[..len].copy_from_slice(&self.block[1..=len]);
        len
    }
}

/// `i2c_smbus_xfer` read or write markers
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadWrite {
    Read = 1,
    Write = 0,
}

#[repr(u32)]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
enum I2CSMBusSize {
    I2C_SMBUS_QUICK = 0,
    I2C_SMBUS_BYTE = 1,
    I2C_SMBUS_BYTE_DATA = 2,
    I2C_SMBUS_WORD_DATA = 3,
    I2C_SMBUS_PROC_CALL = 4,
    I2C_SMBUS_BLOCK_DATA = 5,
    I2C_SMBUS_I2C_BLOCK_BROKEN = 6,
    I2C_SMBUS_BLOCK_PROC_CALL = 7, // SMBus 2.0
    I2C_SMBUS_I2C_BLOCK_DATA = 8,
}

// from include/uapi/linux/i2c-dev.h
const I2C_RETRIES: u16 = 0x0701;
const I2C_TIMEOUT: u16 = 0x0702;
const I2C_SLAVE: u16 = 0x0703;
const I2C_TENBIT: u16 = 0x0704;
const I2C_FUNCS: u16 = 0x0705;
const I2C_SLAVE_FORCE: u16 = 0x0706;
const I2C_RDWR: u16 = 0x0707;
const I2C_PEC: u16 = 0x0708;
const I2C_SMBUS: u16 = 0x0720;

/// Maximum number of messages in one `I2C_RDWR` call
pub const I2C_RDWR_IOCTL_MAX_MSGS: usize = 42;

/// This is the structure as used in the I2C_SMBUS ioctl call
#[repr(C)]
pub struct i2c_smbus_ioctl_data {
    // __u8 read_write;
    read_write: u8,
    // __u8 command;
    command: u8,
    // __u32 size;
    size: u32,
    // union i2c_smbus_data __user *data;
    data: *mut i2c_smbus_data,
}

/// This is the structure as used in the I2C_RDWR ioctl call
// see linux/i2c-dev.h
#[repr(C)]
pub struct i2c_rdwr_ioctl_data {
    // struct i2c_msg __user *msgs;
    msgs: *mut i2c_msg,
    // __u32 nmsgs;
    nmsgs: u32,
}

mod ioctl {
    pub use super::i2c_rdwr_ioctl_data;
    pub use super::i2c_smbus_ioctl_data;
    use super::{
        I2C_FUNCS, I2C_PEC, I2C_RDWR, I2C_RETRIES, I2C_SLAVE, I2C_SLAVE_FORCE, I2C_SMBUS,
        I2C_TENBIT, I2C_TIMEOUT,
    };

    ioctl_write_int_bad!(set_retries, I2C_RETRIES);
    ioctl_write_int_bad!(set_timeout, I2C_TIMEOUT);
    ioctl_write_int_bad!(set_i2c_slave_address, I2C_SLAVE);
    ioctl_write_int_bad!(set_i2c_slave_address_force, I2C_SLAVE_FORCE);
    ioctl_write_int_bad!(set_tenbit, I2C_TENBIT);
    ioctl_write_int_bad!(set_smbus_pec, I2C_PEC);
    ioctl_read_bad!(get_functionality, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, i2c_smbus_ioctl_data);
    ioctl_write_ptr_bad!(i2c_rdwr, I2C_RDWR, i2c_rdwr_ioctl_data);
}

pub fn i2c_set_retries(fd: RawFd, retries: libc::c_int) -> Result<(), I2CError> {
    trace!("I2C_RETRIES {}", retries);
    unsafe {
        ioctl::set_retries(fd, retries)?;
    }
    Ok(())
}

/// Set the adapter timeout, in units of 10ms
pub fn i2c_set_timeout(fd: RawFd, timeout: libc::c_int) -> Result<(), I2CError> {
    trace!("I2C_TIMEOUT {}0ms", timeout);
    unsafe {
        ioctl::set_timeout(fd, timeout)?;
    }
    Ok(())
}

pub fn i2c_set_slave_address(fd: RawFd, slave_address: u16, force: bool) -> Result<(), I2CError> {
    trace!("I2C_SLAVE {:#04x} force={}", slave_address, force);
    unsafe {
        if force {
            ioctl::set_i2c_slave_address_force(fd, i32::from(slave_address))?;
        } else {
            ioctl::set_i2c_slave_address(fd, i32::from(slave_address))?;
        }
    }
    Ok(())
}

pub fn i2c_set_slave_address_10bit(fd: RawFd, tenbit: bool) -> Result<(), I2CError> {
    trace!("I2C_TENBIT {}", tenbit);
    unsafe {
        ioctl::set_tenbit(fd, i32::from(tenbit))?;
    }
    Ok(())
}

pub fn i2c_set_smbus_pec(fd: RawFd, enable: bool) -> Result<(), I2CError> {
    trace!("I2C_PEC {}", enable);
    unsafe {
        ioctl::set_smbus_pec(fd, i32::from(enable))?;
    }
    Ok(())
}

pub fn i2c_get_functionality(fd: RawFd) -> Result<Functionality, I2CError> {
    let mut funcs: libc::c_ulong = 0;
    unsafe {
        ioctl::get_functionality(fd, &mut funcs)?;
    }
    trace!("I2C_FUNCS {:#010x}", funcs);
    Ok(Functionality::from_bits_truncate(funcs as u32))
}

unsafe fn i2c_smbus_access(
    fd: RawFd,
    read_write: ReadWrite,
    command: u8, // can be address or something else
    size: I2CSMBusSize,
    data: *mut i2c_smbus_data,
) -> Result<(), I2CError> {
    trace!(
        "I2C_SMBUS {:?} command={:#04x} size={:?}",
        read_write,
        command,
        size
    );
    let args = i2c_smbus_ioctl_data {
        read_write: read_write as u8,
        command,
        size: size as u32,
        data,
    };

    ioctl::i2c_smbus(fd, &args).map(drop)
}

#[inline]
pub fn i2c_smbus_write_quick(fd: RawFd, value: ReadWrite) -> Result<(), I2CError> {
    unsafe {
        i2c_smbus_access(
            fd,
            value,
            0,
            I2CSMBusSize::I2C_SMBUS_QUICK,
            ptr::null_mut(),
        )
    }
}

#[inline]
pub fn i2c_smbus_read_byte(fd: RawFd) -> Result<u8, I2CError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Read,
            0,
            I2CSMBusSize::I2C_SMBUS_BYTE,
            &mut data,
        )?
    }
    Ok(data.block[0])
}

#[inline]
pub fn i2c_smbus_write_byte(fd: RawFd, value: u8) -> Result<(), I2CError> {
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            value,
            I2CSMBusSize::I2C_SMBUS_BYTE,
            ptr::null_mut(),
        )
    }
}

#[inline]
pub fn i2c_smbus_read_byte_data(fd: RawFd, register: u8) -> Result<u8, I2CError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Read,
            register,
            I2CSMBusSize::I2C_SMBUS_BYTE_DATA,
            &mut data,
        )?;
    }
    Ok(data.block[0])
}

#[inline]
pub fn i2c_smbus_write_byte_data(fd: RawFd, register: u8, value: u8) -> Result<(), I2CError> {
    let mut data = i2c_smbus_data::empty();
    data.block[0] = value;
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            register,
            I2CSMBusSize::I2C_SMBUS_BYTE_DATA,
            &mut data,
        )
    }
}

#[inline]
pub fn i2c_smbus_read_word_data(fd: RawFd, register: u8) -> Result<u16, I2CError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Read,
            register,
            I2CSMBusSize::I2C_SMBUS_WORD_DATA,
            &mut data,
        )?;
    };
    Ok(data.word())
}

#[inline]
pub fn i2c_smbus_write_word_data(fd: RawFd, register: u8, value: u16) -> Result<(), I2CError> {
    let mut data = i2c_smbus_data::with_word(value);
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            register,
            I2CSMBusSize::I2C_SMBUS_WORD_DATA,
            &mut data,
        )
    }
}

#[inline]
pub fn i2c_smbus_process_call(fd: RawFd, register: u8, value: u16) -> Result<u16, I2CError> {
    let mut data = i2c_smbus_data::with_word(value);
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            register,
            I2CSMBusSize::I2C_SMBUS_PROC_CALL,
            &mut data,
        )?;
    }
    Ok(data.word())
}

#[inline]
pub fn i2c_smbus_read_block_data(
    fd: RawFd,
    register: u8,
    values: &mut [u8],
) -> Result<usize, I2CError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Read,
            register,
            I2CSMBusSize::I2C_SMBUS_BLOCK_DATA,
            &mut data,
        )?;
    }
    Ok(data.read_block(values))
}

/// Read `values.len()` bytes (at most 32) without a count byte on the wire
pub fn i2c_smbus_read_i2c_block_data(
    fd: RawFd,
    register: u8,
    values: &mut [u8],
) -> Result<usize, I2CError> {
    let mut data = i2c_smbus_data::empty();
    data.block[0] = cmp::min(values.len(), I2C_SMBUS_BLOCK_MAX) as u8;
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Read,
            register,
            I2CSMBusSize::I2C_SMBUS_I2C_BLOCK_DATA,
            &mut data,
        )?;
    }
    Ok(data.read_block(values))
}

#[inline]
pub fn i2c_smbus_write_block_data(fd: RawFd, register: u8, values: &[u8]) -> Result<(), I2CError> {
    let mut data = i2c_smbus_data::with_block(values, I2C_SMBUS_BLOCK_MAX);
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            register,
            I2CSMBusSize::I2C_SMBUS_BLOCK_DATA,
            &mut data,
        )
    }
}

#[inline]
pub fn i2c_smbus_write_i2c_block_data(
    fd: RawFd,
    register: u8,
    values: &[u8],
) -> Result<(), I2CError> {
    let mut data = i2c_smbus_data::with_block(values, I2C_SMBUS_BLOCK_MAX);
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            register,
            I2CSMBusSize::I2C_SMBUS_I2C_BLOCK_DATA,
            &mut data,
        )
    }
}

#[inline]
pub fn i2c_smbus_block_process_call(
    fd: RawFd,
    register: u8,
    write: &[u8],
    read: &mut [u8],
) -> Result<usize, I2CError> {
    let mut data = i2c_smbus_data::with_block(write, I2C_SMBUS_BLOCK_PROC_CALL_MAX);
    unsafe {
        i2c_smbus_access(
            fd,
            ReadWrite::Write,
            register,
            I2CSMBusSize::I2C_SMBUS_BLOCK_PROC_CALL,
            &mut data,
        )?;
    };
    Ok(data.read_block(read))
}

/// Issue a combined transfer
///
/// # Safety
///
/// Every `buf` must point at `len` bytes that stay valid, and writable for
/// reads, until the call returns.
#[inline]
pub unsafe fn i2c_rdwr(fd: RawFd, values: &mut [i2c_msg]) -> Result<u32, I2CError> {
    trace!("I2C_RDWR {} messages", values.len());
    let i2c_data = i2c_rdwr_ioctl_data {
        msgs: values.as_mut_ptr(),
        nmsgs: values.len() as u32,
    };

    let n = ioctl::i2c_rdwr(fd, &i2c_data)?;
    Ok(n as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_payload_is_counted() {
        let data = i2c_smbus_data::with_block(&[0xde, 0xad, 0xbe, 0xef], I2C_SMBUS_BLOCK_MAX);
        assert_eq!(&data.block[..5], &[4, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(data.block[5], 0);
    }

    #[test]
    fn block_payload_is_clamped() {
        let values = [0xaa; 40];
        let data = i2c_smbus_data::with_block(&values, I2C_SMBUS_BLOCK_PROC_CALL_MAX);
        assert_eq!(data.block[0] as usize, I2C_SMBUS_BLOCK_PROC_CALL_MAX);
        assert_eq!(data.block[31], 0xaa);
        assert_eq!(data.block[32], 0);
    }

    #[test]
    fn received_block_fits_the_caller_buffer() {
        let mut data = i2c_smbus_data::empty();
        data.block[0] = 5;
        data.block[1..6].copy_from_slice(&[1, 2, 3, 4, 5]);

        let mut small = [0u8; 3];
        assert_eq!(data.read_block(&mut small), 3);
        assert_eq!(small, [1, 2, 3]);

        let mut large = [0u8; 8];
        assert_eq!(data.read_block(&mut large), 5);
        assert_eq!(&large[..5], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn bogus_block_count_is_bounded() {
        let mut data = i2c_smbus_data::empty();
        data.block[0] = 0xff;
        let mut out = [0u8; 64];
        assert_eq!(data.read_block(&mut out), I2C_SMBUS_BLOCK_MAX);
    }

    #[test]
    fn words_use_native_order() {
        let data = i2c_smbus_data::with_word(0x1234);
        assert_eq!(data.word(), 0x1234);
        assert_eq!(u16::from_ne_bytes([data.block[0], data.block[1]]), 0x1234);
    }

    #[test]
    fn functionality_composites() {
        assert!(Functionality::SMBUS_EMUL.contains(Functionality::SMBUS_BYTE_DATA));
        assert!(Functionality::SMBUS_EMUL.contains(Functionality::SMBUS_I2C_BLOCK));
        assert!(!Functionality::SMBUS_EMUL.contains(Functionality::SMBUS_READ_BLOCK_DATA));
        assert_eq!(Functionality::SMBUS_EMUL.bits(), 0x0eff_0008);
    }

    #[test]
    fn quick_marker_values() {
        assert_eq!(ReadWrite::Read as u8, 1);
        assert_eq!(ReadWrite::Write as u8, 0);
    }
}
