//! Register addresses, identity constants and value ranges.

/// Default 7-bit I2C address of the module.
pub const DEFAULT_ADDRESS: u8 = 0x54;

/// Product ID reported by the SEN0502 (SKU family SEN, number 502).
pub const EXPECTED_PID: u16 = 0x01F6;

/// Vendor ID reported by DFRobot modules.
pub const DFROBOT_VID: u16 = 0x3343;

/// Gain written at construction unless configured otherwise.
pub const DEFAULT_GAIN: u8 = 25;

// --- Register map ---
pub mod reg {
    pub const PID_MSB: u8 = 0x00;
    pub const PID_LSB: u8 = 0x01;
    pub const VID_MSB: u8 = 0x02;
    pub const VID_LSB: u8 = 0x03;
    pub const VERSION_MSB: u8 = 0x04;
    pub const VERSION_LSB: u8 = 0x05;
    // 0x06 reserved
    pub const ADDRESS: u8 = 0x07;
    pub const COUNT_MSB: u8 = 0x08;
    pub const COUNT_LSB: u8 = 0x09;
    pub const KEY_STATUS: u8 = 0x0A;
    pub const GAIN: u8 = 0x0B;

    /// Size of the register file (0x00..=0x0B).
    pub const FILE_SIZE: usize = 0x0C;

    /// Bytes covered by the identity burst read starting at `PID_MSB`.
    pub const INFO_LEN: usize = 8;
}

// --- Value ranges ---
/// Largest value the 10-bit encoder counter holds.
pub const COUNTER_MAX: u16 = 0x03FF;
/// Smallest accepted gain coefficient.
pub const GAIN_MIN: u8 = 0x01;
/// Largest accepted gain coefficient.
pub const GAIN_MAX: u8 = 0x33;

// --- Button debounce defaults ---
/// Minimum time between effective key-status polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
/// Time after a press edge before a missing release is forced, in milliseconds.
pub const DEFAULT_STUCK_TIMEOUT_MS: u64 = 2000;
