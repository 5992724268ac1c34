//! # visual-rotary-encoder
//!
//! A Rust driver for the DFRobot Gravity visual rotary encoder (SEN0502),
//! a 10-bit rotary encoder with an LED ring and a push button, controlled
//! through a small register file over I²C.
//!
//! The driver does not implement a bus. It talks to the module through the
//! [`RegisterBus`] trait; [`HalBus`] adapts any blocking `embedded-hal` 1.0
//! I²C controller, and [`sim::SimulatedBus`] provides an in-memory module for
//! tests and demos.
//!
//! ## Features
//!
//! *   Identity check (`identify`) and one-shot info read (`read_info`):
//!     product ID (with SKU family decoding), vendor ID, firmware version and
//!     the module's own bus address.
//! *   Encoder counter access (`read_counter`, `write_counter`,
//!     `encoder_as_fraction`), range 0-1023.
//! *   Gain coefficient access (`read_gain`, `write_gain`), range 1-51.
//! *   Debounced button handling (`poll`, `take_down_pending`,
//!     `take_up_pending`, `is_down`) with rate-limited polling and automatic
//!     recovery from a missed release edge.
//!
//! ## Range Policy
//!
//! Writes outside the valid range are not errors: `write_counter` and
//! `write_gain` return `Ok(false)` and perform no bus transaction. Bus
//! failures are always returned as [`Error::Transport`], never swallowed.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use visual_rotary_encoder::{EncoderConfig, HalBus, Result, VisualRotaryEncoder};
//!
//! fn run<I: embedded_hal::i2c::I2c>(i2c: I) -> Result<()> {
//!     let bus = HalBus::new(i2c);
//!     let mut encoder = VisualRotaryEncoder::new(&bus, EncoderConfig::new(0x54).gain(51))?;
//!
//!     if !encoder.identify()?.matches {
//!         eprintln!("No SEN0502 found at {}", encoder.address());
//!         return Ok(());
//!     }
//!     println!("Info: {:?}", encoder.read_info()?);
//!
//!     loop {
//!         encoder.poll()?;
//!         if encoder.take_down_pending() {
//!             println!("Pressed at {:.3}", encoder.encoder_as_fraction()?);
//!         }
//!         std::thread::sleep(std::time::Duration::from_millis(20));
//!     }
//! }
//! ```
//!
//! ## Button Timing
//!
//! `poll` may be called as often as convenient; calls closer together than
//! [`DebounceConfig::poll_interval`] (default 100 ms) return
//! [`PollStatus::RateLimited`] without touching the bus. If no release edge
//! arrives within [`DebounceConfig::stuck_timeout`] (default 2 s) of a
//! press, the button is forced back up and `poll` reports
//! [`PollStatus::StuckReleased`]. Time comes from a [`Clock`]; use
//! [`ManualClock`] to simulate it.
//!
//! ## Sharing a Bus
//!
//! Drivers borrow the bus, so several modules at different addresses can be
//! driven from one [`HalBus`]. Neither the bus adapter nor the driver is
//! thread-safe; drive each encoder from a single thread.

mod consts;
mod error;
pub mod button;
pub mod clock;
pub mod device;
pub mod i2c;
pub mod sim;

pub use button::{ButtonDebouncer, DebounceConfig, PollStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use device::{
    DeviceInfo, EncoderConfig, FirmwareVersion, Identity, ProductId, SkuFamily,
    VisualRotaryEncoder,
};
pub use error::{Error, Result, TransportError};
pub use i2c::{HalBus, I2cAddress, RegisterBus};
// Re-export only essential public constants
pub use consts::{
    COUNTER_MAX, DEFAULT_ADDRESS, DEFAULT_GAIN, DFROBOT_VID, EXPECTED_PID, GAIN_MAX, GAIN_MIN,
};
