// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! An in-memory I2C device for testing drivers without hardware
//!
//! [`MockI2c`] behaves like a simple register-file chip: writing a
//! register number moves an internal pointer, and plain reads and writes
//! continue from that pointer with auto-increment.

use log::trace;
use nix::errno::Errno;

use crate::core;
use crate::error::{Error, Result};
use crate::ffi::{
    Functionality, I2C_RDWR_IOCTL_MAX_MSGS, I2C_SMBUS_BLOCK_MAX, I2C_SMBUS_BLOCK_PROC_CALL_MAX,
};
use crate::message::{self, Message, ReadFlags, WriteFlags};

/// 256 byte-wide registers plus an auto-incrementing pointer
pub struct I2CRegisterMap {
    registers: [u8; 256],
    offset: u8,
}

impl Default for I2CRegisterMap {
    fn default() -> Self {
        I2CRegisterMap::new()
    }
}

impl I2CRegisterMap {
    pub fn new() -> I2CRegisterMap {
        I2CRegisterMap {
            registers: [0x00; 256],
            offset: 0,
        }
    }

    /// Store `data` starting at `offset`, wrapping past the last register
    pub fn write_regs(&mut self, offset: u8, data: &[u8]) {
        trace!("WRITE | {:#04x} : {:?}", offset, data);
        let mut reg = offset;
        for &byte in data {
            self.registers[reg as usize] = byte;
            reg = reg.wrapping_add(1);
        }
    }

    /// Load `data.len()` bytes starting at `offset`
    pub fn read_regs(&self, offset: u8, data: &mut [u8]) {
        let mut reg = offset;
        for byte in data.iter_mut() {
            *byte = self.registers[reg as usize];
            reg = reg.wrapping_add(1);
        }
        trace!("READ  | {:#04x} : {:?}", offset, data);
    }

    /// Write at the pointer and advance it
    fn write_continue(&mut self, data: &[u8]) {
        self.write_regs(self.offset, data);
        self.offset = self.offset.wrapping_add(data.len() as u8);
    }

    /// Read from the pointer and advance it
    fn read_continue(&mut self, data: &mut [u8]) {
        self.read_regs(self.offset, data);
        self.offset = self.offset.wrapping_add(data.len() as u8);
    }

    /// A plain write: the first byte selects the register
    fn write(&mut self, data: &[u8]) {
        if let Some((&offset, rest)) = data.split_first() {
            self.offset = offset;
            self.write_continue(rest);
        }
    }
}

/// A register-file device that answers at a single slave address
pub struct MockI2c {
    regmap: I2CRegisterMap,
    device_address: u16,
    selected: Option<u16>,
    functionality: Functionality,
    pec: bool,
}

impl MockI2c {
    /// A device at `address` supporting plain I2C and all SMBus commands
    pub fn new(address: u16) -> MockI2c {
        MockI2c {
            regmap: I2CRegisterMap::new(),
            device_address: address,
            selected: None,
            functionality: Functionality::I2C
                | Functionality::NO_START
                | Functionality::SMBUS_EMUL
                | Functionality::SMBUS_BLOCK_DATA
                | Functionality::SMBUS_BLOCK_PROC_CALL,
            pec: false,
        }
    }

    /// Restrict the adapter capabilities the device reports and honours
    pub fn with_functionality(mut self, functionality: Functionality) -> MockI2c {
        self.functionality = functionality;
        self
    }

    pub fn functionality(&self) -> Functionality {
        self.functionality
    }

    /// Seed registers starting at `offset`
    pub fn set_registers(&mut self, offset: u8, data: &[u8]) {
        self.regmap.write_regs(offset, data);
    }

    /// The full register file
    pub fn registers(&self) -> &[u8; 256] {
        &self.regmap.registers
    }

    /// Whether PEC was last enabled
    pub fn pec(&self) -> bool {
        self.pec
    }

    fn require(&self, func: Functionality, op: &'static str) -> Result<()> {
        if self.functionality.contains(func) {
            Ok(())
        } else {
            Err(Error::Ioctl {
                op,
                source: Errno::EOPNOTSUPP,
            })
        }
    }

    fn ack(&self, address: u16) -> Result<()> {
        if address == self.device_address {
            Ok(())
        } else {
            Err(Error::Nack { address })
        }
    }

    /// Acknowledge the selected slave before an SMBus or plain transfer
    fn ack_selected(&self) -> Result<()> {
        match self.selected {
            Some(address) => self.ack(address),
            None => Err(Error::InvalidArgument("no slave address selected")),
        }
    }

    fn smbus(&self, func: Functionality) -> Result<()> {
        self.require(func, "I2C_SMBUS")?;
        self.ack_selected()
    }

    fn read_word(&mut self, command: u8) -> u16 {
        let mut word = [0u8; 2];
        self.regmap.offset = command;
        self.regmap.read_continue(&mut word);
        u16::from_le_bytes(word)
    }

    fn write_word(&mut self, command: u8, value: u16) {
        self.regmap.offset = command;
        self.regmap.write_continue(&value.to_le_bytes());
    }

    /// Reject the whole transaction if any message uses a flag the adapter lacks
    fn check_transfer_flags(&self, messages: &[Message]) -> Result<()> {
        let (mut read, write) = message::transfer_flags(self.functionality);
        if self.functionality.contains(Functionality::SMBUS_READ_BLOCK_DATA) {
            read.insert(ReadFlags::RECEIVE_LEN);
        }
        let supported = messages.iter().all(|msg| match *msg {
            Message::Read { flags, .. } => read.contains(flags),
            Message::Write { flags, .. } => write.contains(flags),
        });
        if supported {
            Ok(())
        } else {
            Err(Error::Ioctl {
                op: "I2C_RDWR",
                source: Errno::EOPNOTSUPP,
            })
        }
    }

    fn write_block(&mut self, command: u8, value: &[u8], max: usize) -> Result<()> {
        if value.len() > max {
            return Err(Error::BlockTooLarge {
                len: value.len(),
                max,
            });
        }
        self.regmap.write_regs(command, &[value.len() as u8]);
        self.regmap.write_regs(command.wrapping_add(1), value);
        Ok(())
    }

    fn read_block(&self, command: u8, value: &mut [u8]) -> usize {
        let mut count = [0u8];
        self.regmap.read_regs(command, &mut count);
        let len = (count[0] as usize).min(I2C_SMBUS_BLOCK_MAX).min(value.len());
        self.regmap.read_regs(command.wrapping_add(1), &mut value[..len]);
        len
    }

    fn transfer_read(&mut self, data: &mut &mut [u8], flags: ReadFlags) -> Result<()> {
        if !flags.contains(ReadFlags::RECEIVE_LEN) {
            self.regmap.read_continue(data);
            return Ok(());
        }
        // first byte is the count of the bytes that follow
        let (count, rest) = match data.split_first_mut() {
            Some((count, rest)) => (count, rest),
            None => return Err(Error::InvalidArgument("RECEIVE_LEN read needs a buffer")),
        };
        self.regmap.read_continue(std::slice::from_mut(&mut *count));
        let len = (*count as usize).min(I2C_SMBUS_BLOCK_MAX).min(rest.len());
        self.regmap.read_continue(&mut rest[..len]);
        let buf = std::mem::take(data);
        *data = &mut buf[..=len];
        Ok(())
    }
}

impl core::Master for MockI2c {
    type Error = Error;
}

impl core::Address for MockI2c {
    fn set_slave_address(&mut self, addr: u16, tenbit: bool) -> Result<()> {
        if tenbit {
            self.require(Functionality::TENBIT_ADDR, "I2C_TENBIT")?;
        }
        self.selected = Some(addr);
        Ok(())
    }
}

impl core::RawIo for MockI2c {
    fn i2c_read(&mut self, value: &mut [u8]) -> Result<usize> {
        self.ack_selected()?;
        self.regmap.read_continue(value);
        Ok(value.len())
    }

    fn i2c_write(&mut self, value: &[u8]) -> Result<()> {
        self.ack_selected()?;
        self.regmap.write(value);
        Ok(())
    }
}

impl core::Smbus for MockI2c {
    fn smbus_write_quick(&mut self, _value: bool) -> Result<()> {
        self.smbus(Functionality::SMBUS_QUICK)
    }

    fn smbus_read_byte(&mut self) -> Result<u8> {
        self.smbus(Functionality::SMBUS_READ_BYTE)?;
        let mut byte = [0u8];
        self.regmap.read_continue(&mut byte);
        Ok(byte[0])
    }

    fn smbus_write_byte(&mut self, value: u8) -> Result<()> {
        self.smbus(Functionality::SMBUS_WRITE_BYTE)?;
        self.regmap.offset = value;
        Ok(())
    }

    fn smbus_read_byte_data(&mut self, command: u8) -> Result<u8> {
        self.smbus(Functionality::SMBUS_READ_BYTE_DATA)?;
        self.regmap.offset = command;
        let mut byte = [0u8];
        self.regmap.read_continue(&mut byte);
        Ok(byte[0])
    }

    fn smbus_write_byte_data(&mut self, command: u8, value: u8) -> Result<()> {
        self.smbus(Functionality::SMBUS_WRITE_BYTE_DATA)?;
        self.regmap.write(&[command, value]);
        Ok(())
    }

    fn smbus_read_word_data(&mut self, command: u8) -> Result<u16> {
        self.smbus(Functionality::SMBUS_READ_WORD_DATA)?;
        Ok(self.read_word(command))
    }

    fn smbus_write_word_data(&mut self, command: u8, value: u16) -> Result<()> {
        self.smbus(Functionality::SMBUS_WRITE_WORD_DATA)?;
        self.write_word(command, value);
        Ok(())
    }

    fn smbus_process_call(&mut self, command: u8, value: u16) -> Result<u16> {
        self.smbus(Functionality::SMBUS_PROC_CALL)?;
        self.write_word(command, value);
        Ok(self.read_word(command))
    }

    fn smbus_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize> {
        self.smbus(Functionality::SMBUS_READ_BLOCK_DATA)?;
        Ok(self.read_block(command, value))
    }

    fn smbus_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<()> {
        self.smbus(Functionality::SMBUS_WRITE_BLOCK_DATA)?;
        self.write_block(command, value, I2C_SMBUS_BLOCK_MAX)
    }
}

impl core::Smbus20 for MockI2c {
    fn smbus_process_call_block(
        &mut self,
        command: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<usize> {
        self.smbus(Functionality::SMBUS_BLOCK_PROC_CALL)?;
        self.write_block(command, write, I2C_SMBUS_BLOCK_PROC_CALL_MAX)?;
        Ok(self.read_block(command, read))
    }
}

impl core::SmbusPec for MockI2c {
    fn smbus_set_pec(&mut self, pec: bool) -> Result<()> {
        self.require(Functionality::SMBUS_PEC, "I2C_PEC")?;
        self.pec = pec;
        Ok(())
    }
}

impl core::BlockTransfer for MockI2c {
    fn i2c_read_block_data(&mut self, command: u8, value: &mut [u8]) -> Result<usize> {
        self.ack_selected()?;
        if !self.functionality.contains(Functionality::I2C) {
            self.require(Functionality::SMBUS_READ_I2C_BLOCK, "I2C_SMBUS")?;
        }
        let len = if self.functionality.contains(Functionality::I2C) {
            value.len()
        } else {
            value.len().min(I2C_SMBUS_BLOCK_MAX)
        };
        self.regmap.offset = command;
        self.regmap.read_continue(&mut value[..len]);
        Ok(len)
    }

    fn i2c_write_block_data(&mut self, command: u8, value: &[u8]) -> Result<()> {
        self.ack_selected()?;
        if !self.functionality.contains(Functionality::I2C) {
            self.require(Functionality::SMBUS_WRITE_I2C_BLOCK, "I2C_SMBUS")?;
            if value.len() > I2C_SMBUS_BLOCK_MAX {
                return Err(Error::BlockTooLarge {
                    len: value.len(),
                    max: I2C_SMBUS_BLOCK_MAX,
                });
            }
        }
        self.regmap.offset = command;
        self.regmap.write_continue(value);
        Ok(())
    }
}

impl core::BulkTransfer for MockI2c {
    fn i2c_transfer_support(&mut self) -> Result<(ReadFlags, WriteFlags)> {
        Ok(message::transfer_flags(self.functionality))
    }

    fn i2c_transfer(&mut self, messages: &mut [Message]) -> Result<()> {
        self.require(Functionality::I2C, "I2C_RDWR")?;
        if messages.len() > I2C_RDWR_IOCTL_MAX_MSGS {
            return Err(Error::TooManyMessages {
                count: messages.len(),
                max: I2C_RDWR_IOCTL_MAX_MSGS,
            });
        }
        self.check_transfer_flags(messages)?;

        for msg in messages.iter_mut() {
            self.ack(msg.address())?;
            match *msg {
                Message::Read {
                    ref mut data,
                    flags,
                    ..
                } => self.transfer_read(data, flags)?,
                Message::Write { data, flags, .. } => {
                    if flags.contains(WriteFlags::NO_START) {
                        self.regmap.write_continue(data);
                    } else {
                        self.regmap.write(data);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;

    fn device() -> MockI2c {
        let mut dev = MockI2c::new(0x48);
        dev.set_slave_address(0x48, false).unwrap();
        dev
    }

    #[test]
    fn plain_io_auto_increments() {
        let mut dev = device();
        dev.i2c_write(&[0x10, 1, 2, 3]).unwrap();
        dev.i2c_write(&[0x11]).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(dev.i2c_read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [2, 3]);
    }

    #[test]
    fn register_pointer_wraps() {
        let mut dev = device();
        dev.i2c_write(&[0xff, 0xaa, 0xbb]).unwrap();
        assert_eq!(dev.registers()[0xff], 0xaa);
        assert_eq!(dev.registers()[0x00], 0xbb);
    }

    #[test]
    fn words_are_little_endian() {
        let mut dev = device();
        dev.smbus_write_word_data(0x02, 0xbeef).unwrap();
        assert_eq!(&dev.registers()[2..4], &[0xef, 0xbe]);
        assert_eq!(dev.smbus_read_word_data(0x02).unwrap(), 0xbeef);
    }

    #[test]
    fn word_access_advances_the_pointer() {
        let mut dev = device();
        dev.set_registers(0x04, &[0x34, 0x12, 0x56]);
        assert_eq!(dev.smbus_read_word_data(0x04).unwrap(), 0x1234);
        assert_eq!(dev.smbus_read_byte().unwrap(), 0x56);

        dev.smbus_write_word_data(0x10, 0xaabb).unwrap();
        dev.set_registers(0x12, &[0x77]);
        let mut buf = [0u8; 1];
        dev.i2c_read(&mut buf).unwrap();
        assert_eq!(buf, [0x77]);
    }

    #[test]
    fn smbus_blocks_are_counted() {
        let mut dev = device();
        dev.smbus_write_block_data(0x20, &[9, 8, 7]).unwrap();
        assert_eq!(&dev.registers()[0x20..0x24], &[3, 9, 8, 7]);

        let mut buf = [0u8; 32];
        assert_eq!(dev.smbus_read_block_data(0x20, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[9, 8, 7]);
    }

    #[test]
    fn unselected_address_is_not_acknowledged() {
        let mut dev = MockI2c::new(0x48);
        dev.set_slave_address(0x49, false).unwrap();
        match dev.smbus_read_byte() {
            Err(Error::Nack { address: 0x49 }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn receive_len_truncates_the_buffer() {
        let mut dev = device();
        dev.set_registers(0x30, &[2, 0x11, 0x22, 0x33]);
        let mut buf = [0u8; 8];
        let mut msgs = [
            Message::write(0x48, &[0x30]),
            Message::Read {
                address: 0x48,
                data: &mut buf,
                flags: ReadFlags::RECEIVE_LEN,
            },
        ];
        dev.i2c_transfer(&mut msgs).unwrap();
        assert_eq!(msgs[1].len(), 3);
        drop(msgs);
        assert_eq!(&buf[..3], &[2, 0x11, 0x22]);
    }

    #[test]
    fn missing_functionality_is_reported() {
        let mut dev = MockI2c::new(0x48).with_functionality(Functionality::SMBUS_BYTE);
        dev.set_slave_address(0x48, false).unwrap();
        match dev.i2c_transfer(&mut [Message::write(0x48, &[0])]) {
            Err(Error::Ioctl { op: "I2C_RDWR", .. }) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(dev.smbus_set_pec(true).is_err());
    }

    #[test]
    fn transfer_flags_need_matching_functionality() {
        let mut dev = MockI2c::new(0x50).with_functionality(Functionality::I2C);
        let mut buf = [0u8; 2];

        match dev.i2c_transfer(&mut [
            Message::write(0x50, &[0x00, 0x09]),
            Message::Write {
                address: 0x50,
                data: &[1, 2],
                flags: WriteFlags::NO_START | WriteFlags::IGNORE_NACK,
            },
        ]) {
            Err(Error::Ioctl {
                op: "I2C_RDWR",
                source: Errno::EOPNOTSUPP,
            }) => (),
            other => panic!("unexpected {:?}", other),
        }
        // nothing from the rejected transaction reached the registers
        assert_eq!(&dev.registers()[..3], &[0, 0, 0]);

        match dev.i2c_transfer(&mut [Message::Read {
            address: 0x50,
            data: &mut buf,
            flags: ReadFlags::TENBIT_ADDR | ReadFlags::STOP,
        }]) {
            Err(Error::Ioctl {
                op: "I2C_RDWR",
                source: Errno::EOPNOTSUPP,
            }) => (),
            other => panic!("unexpected {:?}", other),
        }

        let mut dev = MockI2c::new(0x50).with_functionality(
            Functionality::I2C | Functionality::PROTOCOL_MANGLING | Functionality::TENBIT_ADDR,
        );
        dev.i2c_transfer(&mut [Message::Read {
            address: 0x50,
            data: &mut buf,
            flags: ReadFlags::TENBIT_ADDR | ReadFlags::STOP,
        }])
        .unwrap();
    }
}
