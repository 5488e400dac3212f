// Copyright 2015, Paul Osborne <osbpau@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;

use thiserror::Error;

/// Error that occurred while performing an I2C or SMBus operation
#[derive(Debug, Error)]
pub enum Error {
    /// Opening, reading or writing the device file failed
    #[error("i2c device I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The kernel rejected an ioctl request
    #[error("{op} ioctl failed: {source}")]
    Ioctl {
        /// Name of the ioctl request that failed
        op: &'static str,
        /// Errno reported by the kernel
        #[source]
        source: nix::Error,
    },

    /// More messages were queued than a single `I2C_RDWR` call accepts
    #[error("{count} messages exceed the i2c transfer limit of {max}")]
    TooManyMessages {
        /// Number of messages requested
        count: usize,
        /// Kernel limit
        max: usize,
    },

    /// An SMBus block payload is larger than the protocol allows
    #[error("block of {len} bytes exceeds the SMBus limit of {max}")]
    BlockTooLarge {
        /// Payload length requested
        len: usize,
        /// Protocol limit
        max: usize,
    },

    /// A parameter cannot be represented in the kernel interface
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// No device acknowledged the given address
    #[error("no acknowledgement from address {address:#04x}")]
    Nack {
        /// Slave address that went unanswered
        address: u16,
    },
}

/// Result of an I2C operation
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn ioctl(op: &'static str) -> impl FnOnce(nix::Error) -> Error {
        move |source| Error::Ioctl { op, source }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Io(e) => e,
            Error::Ioctl { source, .. } => io::Error::from_raw_os_error(source as i32),
            Error::Nack { .. } => io::Error::new(io::ErrorKind::NotFound, e),
            Error::TooManyMessages { .. }
            | Error::BlockTooLarge { .. }
            | Error::InvalidArgument(_) => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn ioctl_errors_keep_their_errno() {
        let err = Error::Ioctl {
            op: "I2C_SMBUS",
            source: Errno::ENXIO,
        };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.raw_os_error(), Some(libc::ENXIO));
    }

    #[test]
    fn argument_errors_are_invalid_input() {
        let err: io::Error = Error::BlockTooLarge { len: 40, max: 32 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err: io::Error = Error::TooManyMessages { count: 43, max: 42 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn display_names_the_failing_request() {
        let err = Error::Ioctl {
            op: "I2C_RDWR",
            source: Errno::EREMOTEIO,
        };
        assert!(err.to_string().starts_with("I2C_RDWR ioctl failed"));
    }
}
