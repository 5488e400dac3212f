// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use crate::ffi::{self, Flags};

/// Part of a combined I2C transaction.
#[derive(Debug)]
pub enum Message<'a> {
    /// I2C read command
    Read {
        /// The slave address of the device to read from.
        address: u16,
        /// A data buffer to read into.
        data: &'a mut [u8],
        /// Additional flags can modify the operation to work around device quirks.
        flags: ReadFlags,
    },
    /// I2C write command
    Write {
        /// The slave address of the device to write to.
        address: u16,
        /// The data to write.
        data: &'a [u8],
        /// Additional flags can modify the operation to work around device quirks.
        flags: WriteFlags,
    },
}

impl<'a> Message<'a> {
    /// A plain read of `data.len()` bytes from `address`
    pub fn read(address: u16, data: &'a mut [u8]) -> Self {
        Message::Read {
            address,
            data,
            flags: ReadFlags::default(),
        }
    }

    /// A plain write of `data` to `address`
    pub fn write(address: u16, data: &'a [u8]) -> Self {
        Message::Write {
            address,
            data,
            flags: WriteFlags::default(),
        }
    }

    /// Byte length of the message data buffer.
    pub fn len(&self) -> usize {
        match *self {
            Message::Read { ref data, .. } => data.len(),
            Message::Write { data, .. } => data.len(),
        }
    }

    /// Whether the message carries no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the message's slave.
    pub fn address(&self) -> u16 {
        match *self {
            Message::Read { address, .. } => address,
            Message::Write { address, .. } => address,
        }
    }

    /// Whether data flows from the slave to the master.
    pub fn is_read(&self) -> bool {
        matches!(*self, Message::Read { .. })
    }

    /// Kernel `i2c_msg` flags for this message
    pub(crate) fn raw_flags(&self) -> Flags {
        match *self {
            Message::Read { flags, .. } => Flags::from_bits_truncate(flags.bits()) | Flags::RD,
            Message::Write { flags, .. } => Flags::from_bits_truncate(flags.bits()),
        }
    }
}

bitflags! {
    /// Flags to work around device quirks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ReadFlags: u16 {
        /// This is a 10-bit chip address.
        const TENBIT_ADDR = Flags::TEN.bits();
        /// The first received byte will indicate the remaining length of the transfer.
        const RECEIVE_LEN = Flags::RECV_LEN.bits();
        /// NACK bit is generated for this read.
        ///
        /// Requires `Functionality::PROTOCOL_MANGLING`
        const NACK = Flags::NO_RD_ACK.bits();
        /// Flips the meaning of the read/write address bit for misbehaving devices.
        ///
        /// Requires `Functionality::PROTOCOL_MANGLING`
        const REVERSE_RW = Flags::REV_DIR_ADDR.bits();
        /// Do not generate a START condition or the address start byte. When
        /// used for the first message, a START condition is still generated.
        ///
        /// This can be used to combine multiple buffers into a single I2C transfer,
        /// usually without a direction change.
        ///
        /// Requires `Functionality::NO_START`
        const NO_START = Flags::NOSTART.bits();
        /// Force a STOP condition after this message.
        ///
        /// Requires `Functionality::PROTOCOL_MANGLING`
        const STOP = Flags::STOP.bits();
    }
}

bitflags! {
    /// Flags to work around device quirks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct WriteFlags: u16 {
        /// This is a 10-bit chip address.
        const TENBIT_ADDR = Flags::TEN.bits();
        /// Treat NACK as an ACK and prevent it from interrupting the transfer.
        ///
        /// Requires `Functionality::PROTOCOL_MANGLING`
        const IGNORE_NACK = Flags::IGNORE_NAK.bits();
        /// Flips the meaning of the read/write address bit for misbehaving devices.
        ///
        /// Requires `Functionality::PROTOCOL_MANGLING`
        const REVERSE_RW = Flags::REV_DIR_ADDR.bits();
        /// Do not generate a START condition or the address start byte. When
        /// used for the first message, a START condition is still generated.
        ///
        /// This can be used to combine multiple buffers into a single I2C transfer,
        /// usually without a direction change.
        ///
        /// Requires `Functionality::NO_START`
        const NO_START = Flags::NOSTART.bits();
        /// Force a STOP condition after this message.
        ///
        /// Requires `Functionality::PROTOCOL_MANGLING`
        const STOP = Flags::STOP.bits();
    }
}

impl Default for ReadFlags {
    fn default() -> Self {
        ReadFlags::empty()
    }
}

impl Default for WriteFlags {
    fn default() -> Self {
        WriteFlags::empty()
    }
}

impl ReadFlags {
    /// `TENBIT_ADDR` when `tenbit` is set, otherwise empty
    pub fn addressing(tenbit: bool) -> Self {
        if tenbit {
            ReadFlags::TENBIT_ADDR
        } else {
            ReadFlags::empty()
        }
    }
}

impl WriteFlags {
    /// `TENBIT_ADDR` when `tenbit` is set, otherwise empty
    pub fn addressing(tenbit: bool) -> Self {
        if tenbit {
            WriteFlags::TENBIT_ADDR
        } else {
            WriteFlags::empty()
        }
    }
}

/// The flags usable with `i2c_transfer` on an adapter with the given functionality
pub fn transfer_flags(func: ffi::Functionality) -> (ReadFlags, WriteFlags) {
    use crate::ffi::Functionality;

    let (mut read, mut write) = (ReadFlags::empty(), WriteFlags::empty());
    if func.contains(Functionality::PROTOCOL_MANGLING) {
        read.insert(ReadFlags::NACK | ReadFlags::REVERSE_RW | ReadFlags::STOP);
        write.insert(WriteFlags::IGNORE_NACK | WriteFlags::REVERSE_RW | WriteFlags::STOP);
    }
    if func.contains(Functionality::NO_START) {
        read.insert(ReadFlags::NO_START);
        write.insert(WriteFlags::NO_START);
    }
    if func.contains(Functionality::TENBIT_ADDR) {
        read.insert(ReadFlags::TENBIT_ADDR);
        write.insert(WriteFlags::TENBIT_ADDR);
    }
    (read, write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::Functionality;

    #[test]
    fn reads_carry_the_rd_bit() {
        let mut buf = [0u8; 4];
        let msg = Message::Read {
            address: 0x50,
            data: &mut buf,
            flags: ReadFlags::NO_START,
        };
        assert_eq!(msg.raw_flags(), Flags::RD | Flags::NOSTART);
        assert!(msg.is_read());
        assert_eq!(msg.len(), 4);
        assert_eq!(msg.address(), 0x50);
    }

    #[test]
    fn writes_keep_their_flags() {
        let msg = Message::Write {
            address: 0x1d,
            data: &[0x2d, 0x08],
            flags: WriteFlags::IGNORE_NACK | WriteFlags::TENBIT_ADDR,
        };
        assert_eq!(msg.raw_flags(), Flags::IGNORE_NAK | Flags::TEN);
        assert!(!msg.is_read());
    }

    #[test]
    fn default_flags_are_empty() {
        assert!(ReadFlags::default().is_empty());
        assert!(WriteFlags::default().is_empty());
        assert!(Message::write(0x20, &[]).is_empty());
    }

    #[test]
    fn transfer_flags_follow_functionality() {
        let (read, write) = transfer_flags(Functionality::I2C);
        assert!(read.is_empty());
        assert!(write.is_empty());

        let (read, write) = transfer_flags(Functionality::I2C | Functionality::PROTOCOL_MANGLING);
        assert_eq!(read, ReadFlags::NACK | ReadFlags::REVERSE_RW | ReadFlags::STOP);
        assert_eq!(
            write,
            WriteFlags::IGNORE_NACK | WriteFlags::REVERSE_RW | WriteFlags::STOP
        );

        let (read, write) = transfer_flags(Functionality::NO_START | Functionality::TENBIT_ADDR);
        assert_eq!(read, ReadFlags::NO_START | ReadFlags::TENBIT_ADDR);
        assert_eq!(write, WriteFlags::NO_START | WriteFlags::TENBIT_ADDR);
        assert!(!read.contains(ReadFlags::RECEIVE_LEN));
    }
}
