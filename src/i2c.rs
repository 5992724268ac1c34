//! Bus transport abstraction and I2C addressing.

use crate::error::{Error, Result, TransportError};
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use log::trace;
use std::cell::RefCell;
use std::fmt;

/// A 7-bit I2C device address accepted by the module (1-127).
/// Use `I2cAddress::new(addr)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Creates an address, checking validity (1-127).
    pub fn new(addr: u8) -> Result<Self> {
        if (0x01..=0x7F).contains(&addr) {
            Ok(I2cAddress(addr))
        } else {
            Err(Error::InvalidAddress(addr))
        }
    }

    /// Returns the raw 7-bit address.
    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Register-oriented block transport supplied by the application.
///
/// Each call is exactly one bus transaction with no implicit retries.
/// Methods take `&self` so that several drivers can share one bus; the
/// implementation is responsible for serialising their transactions.
pub trait RegisterBus {
    /// Writes `data` to consecutive registers starting at `register`.
    fn write_block(
        &self,
        address: I2cAddress,
        register: u8,
        data: &[u8],
    ) -> std::result::Result<(), TransportError>;

    /// Reads `length` bytes from consecutive registers starting at `register`.
    fn read_block(
        &self,
        address: I2cAddress,
        register: u8,
        length: usize,
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn write_block(
        &self,
        address: I2cAddress,
        register: u8,
        data: &[u8],
    ) -> std::result::Result<(), TransportError> {
        (**self).write_block(address, register, data)
    }

    fn read_block(
        &self,
        address: I2cAddress,
        register: u8,
        length: usize,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).read_block(address, register, length)
    }
}

/// Adapts any blocking `embedded-hal` I2C controller into a [`RegisterBus`].
///
/// Register writes are sent as `[register, data...]`; reads as a
/// write-then-read of `[register]`. Access is serialised through a
/// `RefCell`, so the adapter can be shared by reference between drivers on
/// one thread.
///
/// **Note:** This adapter is not thread-safe (`!Sync`).
#[derive(Debug)]
pub struct HalBus<I2C> {
    i2c: RefCell<I2C>,
}

impl<I2C: I2c> HalBus<I2C> {
    /// Wraps an I2C controller.
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c: RefCell::new(i2c),
        }
    }

    /// Returns the wrapped controller.
    pub fn into_inner(self) -> I2C {
        self.i2c.into_inner()
    }

    fn with_i2c<T>(
        &self,
        address: I2cAddress,
        op: impl FnOnce(&mut I2C) -> std::result::Result<T, I2C::Error>,
    ) -> std::result::Result<T, TransportError> {
        let mut i2c = self.i2c.try_borrow_mut().map_err(|_| TransportError::Busy)?;
        op(&mut *i2c).map_err(|e| map_error_kind(address, e.kind(), &e))
    }
}

fn map_error_kind(
    address: I2cAddress,
    kind: ErrorKind,
    source: &impl fmt::Debug,
) -> TransportError {
    match kind {
        ErrorKind::NoAcknowledge(_) => TransportError::Nack { address },
        ErrorKind::ArbitrationLoss => TransportError::ArbitrationLost { address },
        ErrorKind::Bus => TransportError::Bus { address },
        ErrorKind::Overrun => TransportError::Overrun { address },
        _ => TransportError::Other(format!("{:?}", source)),
    }
}

impl<I2C: I2c> RegisterBus for HalBus<I2C> {
    fn write_block(
        &self,
        address: I2cAddress,
        register: u8,
        data: &[u8],
    ) -> std::result::Result<(), TransportError> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        trace!("I2C write to {}: {:02X?}", address, frame);
        self.with_i2c(address, |i2c| i2c.write(address.value(), &frame))
    }

    fn read_block(
        &self,
        address: I2cAddress,
        register: u8,
        length: usize,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let mut buffer = vec![0u8; length];
        self.with_i2c(address, |i2c| {
            i2c.write_read(address.value(), &[register], &mut buffer)
        })?;
        trace!(
            "I2C read from {} register 0x{:02X}: {:02X?}",
            address,
            register,
            buffer
        );
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;

    #[test]
    fn test_address_validation() {
        assert!(I2cAddress::new(0x01).is_ok());
        assert!(I2cAddress::new(0x54).is_ok());
        assert!(I2cAddress::new(0x7F).is_ok());
        assert_eq!(I2cAddress::new(0x00), Err(Error::InvalidAddress(0x00)));
        assert_eq!(I2cAddress::new(0x80), Err(Error::InvalidAddress(0x80)));
        assert_eq!(I2cAddress::new(0xFF), Err(Error::InvalidAddress(0xFF)));
    }

    #[test]
    fn test_address_display() {
        let addr = I2cAddress::new(0x54).unwrap();
        assert_eq!(format!("{addr}"), "0x54");
        assert_eq!(addr.value(), 0x54);
    }

    #[test]
    fn test_error_kind_mapping() {
        let addr = I2cAddress::new(0x55).unwrap();
        assert_eq!(
            map_error_kind(addr, ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data), &()),
            TransportError::Nack { address: addr }
        );
        assert_eq!(
            map_error_kind(addr, ErrorKind::ArbitrationLoss, &()),
            TransportError::ArbitrationLost { address: addr }
        );
        assert_eq!(
            map_error_kind(addr, ErrorKind::Bus, &()),
            TransportError::Bus { address: addr }
        );
        assert_eq!(
            map_error_kind(addr, ErrorKind::Overrun, &()),
            TransportError::Overrun { address: addr }
        );
        assert!(matches!(
            map_error_kind(addr, ErrorKind::Other, &"timeout"),
            TransportError::Other(_)
        ));
    }
}
