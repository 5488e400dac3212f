// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Behaviour of `I2c` that does not need a real adapter: argument checks
// happen before any ioctl, and everything else reaches the kernel, which
// rejects i2c requests on a regular file with ENOTTY.

use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd};

use i2c_linux::{Error, I2c, Message, ReadWrite};
use nix::errno::Errno;

fn regular_file() -> I2c<std::fs::File> {
    I2c::new(tempfile::tempfile().unwrap())
}

#[test]
fn read_and_write_pass_through() {
    let mut i2c = regular_file();
    i2c.write_all(&[0x01, 0x02, 0x03]).unwrap();
    i2c.flush().unwrap();

    i2c.inner_mut().seek(SeekFrom::Start(0)).unwrap();
    let mut buf = [0u8; 3];
    i2c.read_exact(&mut buf).unwrap();
    assert_eq!(buf, [0x01, 0x02, 0x03]);
}

#[test]
fn raw_fd_round_trip() {
    let i2c = regular_file();
    let fd = i2c.as_raw_fd();
    let fd2 = i2c.into_raw_fd();
    assert_eq!(fd, fd2);

    let i2c = unsafe { I2c::from_raw_fd(fd2) };
    assert_eq!(i2c.as_raw_fd(), fd);
    assert_eq!(i2c.address(), None);
}

#[test]
fn from_path_opens_read_write() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut i2c = I2c::from_path(file.path()).unwrap();
    i2c.write_all(b"ok").unwrap();
    assert_eq!(i2c.into_inner().metadata().unwrap().len(), 2);
}

#[test]
fn too_many_messages_are_rejected() {
    let mut i2c = regular_file();
    let data = [0u8; 1];
    let mut msgs: Vec<Message> = (0..43).map(|_| Message::write(0x50, &data)).collect();
    match i2c.i2c_transfer(&mut msgs) {
        Err(Error::TooManyMessages { count: 43, max: 42 }) => (),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn huge_messages_are_rejected() {
    let mut i2c = regular_file();
    let data = vec![0u8; 70_000];
    match i2c.i2c_transfer(&mut [Message::write(0x50, &data)]) {
        Err(Error::InvalidArgument(_)) => (),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn oversized_smbus_blocks_are_rejected() {
    let mut i2c = regular_file();
    match i2c.smbus_write_block_data(0x10, &[0u8; 33]) {
        Err(Error::BlockTooLarge { len: 33, max: 32 }) => (),
        other => panic!("unexpected {:?}", other),
    }
    match i2c.smbus_block_process_call(0x10, &[0u8; 32], &mut [0u8; 32]) {
        Err(Error::BlockTooLarge { len: 32, max: 31 }) => (),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn block_write_without_functionality_uses_smbus_limits() {
    // the functionality query fails, so there is no emulation to fall back to
    let mut i2c = regular_file();
    match i2c.i2c_write_block_data(0x00, &[0u8; 40]) {
        Err(Error::BlockTooLarge { len: 40, max: 32 }) => (),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn ioctls_on_a_regular_file_report_enotty() {
    let mut i2c = regular_file();
    match i2c.smbus_read_byte_data(0x00) {
        Err(Error::Ioctl {
            op: "I2C_SMBUS",
            source: Errno::ENOTTY,
        }) => (),
        other => panic!("unexpected {:?}", other),
    }
    match i2c.smbus_write_quick(ReadWrite::Write) {
        Err(Error::Ioctl { op: "I2C_SMBUS", .. }) => (),
        other => panic!("unexpected {:?}", other),
    }
    match i2c.i2c_functionality() {
        Err(Error::Ioctl { op: "I2C_FUNCS", .. }) => (),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn failed_address_selection_is_not_recorded() {
    let mut i2c = regular_file();
    match i2c.smbus_set_slave_address(0x50, false) {
        Err(Error::Ioctl { op: "I2C_SLAVE", .. }) => (),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(i2c.address(), None);

    match i2c.smbus_set_slave_address_force(0x50, false) {
        Err(Error::Ioctl {
            op: "I2C_SLAVE_FORCE",
            ..
        }) => (),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(i2c.address(), None);
}

#[test]
fn errors_convert_to_io_errors() {
    let mut i2c = regular_file();
    let err: std::io::Error = i2c.smbus_read_byte().unwrap_err().into();
    assert_eq!(err.raw_os_error(), Some(libc::ENOTTY));
}
