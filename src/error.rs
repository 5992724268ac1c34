use crate::i2c::I2cAddress;
use thiserror::Error;

/// Failures reported by the bus transport.
///
/// These are always surfaced to the caller and never retried by the driver.
/// A transport failure is distinct from "no key edge pending" and from a
/// write rejected for being out of range, both of which are `Ok` results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The device did not acknowledge its address or a data byte.
    #[error("No acknowledge from device at I2C address {address}")]
    Nack {
        /// The address that sent the NACK.
        address: I2cAddress,
    },
    /// Another bus master won arbitration during the transaction.
    #[error("I2C arbitration lost at address {address}")]
    ArbitrationLost {
        /// The address being accessed.
        address: I2cAddress,
    },
    /// Misplaced START/STOP or other electrical bus error.
    #[error("I2C bus error at address {address}")]
    Bus {
        /// The address being accessed.
        address: I2cAddress,
    },
    /// The controller could not keep up with the data rate.
    #[error("I2C overrun at address {address}")]
    Overrun {
        /// The address being accessed.
        address: I2cAddress,
    },
    /// The transport returned fewer bytes than requested.
    #[error(
        "Short read from {address} register 0x{register:02X} (expected {expected} bytes, got {actual})"
    )]
    ShortRead {
        /// The address being accessed.
        address: I2cAddress,
        /// First register of the block read.
        register: u8,
        /// Number of bytes requested.
        expected: usize,
        /// Number of bytes returned.
        actual: usize,
    },
    /// The bus is already in use by a transaction on this thread.
    #[error("Bus is busy with another transaction")]
    Busy,
    /// Any other transport-specific failure (timeout, disconnect, ...).
    #[error("Transport error: {0}")]
    Other(String),
}

/// Errors that can occur when using the encoder driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bus communication failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Device address outside the 7-bit range the module accepts (1-127).
    #[error("Invalid device address 0x{0:02X}: must be 1-127")]
    InvalidAddress(u8),
}

/// Result type alias for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;
