//! Register access and identity handling for the visual rotary encoder.

use crate::button::{ButtonDebouncer, DebounceConfig};
use crate::clock::{Clock, SystemClock};
use crate::consts::{self, reg};
use crate::error::{Result, TransportError};
use crate::i2c::{I2cAddress, RegisterBus};
use log::{debug, trace, warn};
use std::fmt;
use std::time::Duration;

/// SKU family encoded in the top two bits of the product ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkuFamily {
    Sen,
    Dfr,
    Tel,
    Unknown,
}

impl SkuFamily {
    fn prefix(&self) -> &'static str {
        match self {
            SkuFamily::Sen => "SEN",
            SkuFamily::Dfr => "DFR",
            SkuFamily::Tel => "TEL",
            SkuFamily::Unknown => "???",
        }
    }
}

/// A 16-bit product ID: SKU family in bits 15-14, product number in bits 13-0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductId(pub u16);

impl ProductId {
    /// Returns the raw register value.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn sku_family(&self) -> SkuFamily {
        match self.0 >> 14 {
            0b00 => SkuFamily::Sen,
            0b01 => SkuFamily::Dfr,
            0b10 => SkuFamily::Tel,
            _ => SkuFamily::Unknown,
        }
    }

    /// Returns the product number (low 14 bits).
    #[inline]
    pub fn number(&self) -> u16 {
        self.0 & 0x3FFF
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.sku_family().prefix(), self.number())
    }
}

/// Firmware revision packed one nibble per field: 0x0100 is V0.1.0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirmwareVersion(pub u16);

impl FirmwareVersion {
    #[inline]
    pub fn major(&self) -> u8 {
        (self.0 >> 12) as u8 & 0x0F
    }
    #[inline]
    pub fn minor(&self) -> u8 {
        (self.0 >> 8) as u8 & 0x0F
    }
    #[inline]
    pub fn patch(&self) -> u8 {
        (self.0 >> 4) as u8 & 0x0F
    }
    #[inline]
    pub fn build(&self) -> u8 {
        self.0 as u8 & 0x0F
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.patch(),
            self.build()
        )
    }
}

/// Basic module information read in one burst from registers 0x00-0x07.
///
/// This is a snapshot; it is not refreshed unless `read_info` is called again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub product_id: ProductId,
    pub vendor_id: u16,
    pub version: FirmwareVersion,
    /// Bus address the module reports for itself (1-127).
    pub bus_address: u8,
}

impl DeviceInfo {
    fn decode(data: &[u8]) -> Self {
        // Byte 6 is reserved.
        DeviceInfo {
            product_id: ProductId(u16::from_be_bytes([data[0], data[1]])),
            vendor_id: u16::from_be_bytes([data[2], data[3]]),
            version: FirmwareVersion(u16::from_be_bytes([data[4], data[5]])),
            bus_address: data[7],
        }
    }
}

/// Result of [`VisualRotaryEncoder::identify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub product_id: ProductId,
    /// Whether `product_id` is the SEN0502 product ID.
    pub matches: bool,
}

/// Construction parameters for [`VisualRotaryEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// 7-bit device address (1-127).
    pub address: u8,
    /// Gain coefficient written at construction (1-51).
    pub gain: u8,
    pub debounce: DebounceConfig,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            address: consts::DEFAULT_ADDRESS,
            gain: consts::DEFAULT_GAIN,
            debounce: DebounceConfig::default(),
        }
    }
}

impl EncoderConfig {
    /// Default configuration for a module at `address`.
    pub fn new(address: u8) -> Self {
        EncoderConfig {
            address,
            ..Default::default()
        }
    }

    pub fn gain(mut self, gain: u8) -> Self {
        self.gain = gain;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.debounce.poll_interval = interval;
        self
    }

    pub fn stuck_timeout(mut self, timeout: Duration) -> Self {
        self.debounce.stuck_timeout = timeout;
        self
    }
}

/// A DFRobot visual rotary encoder (SEN0502) on a register bus.
///
/// The bus is borrowed or shared, not owned exclusively: pass `&bus` to let
/// several encoders use one transport. Each instance owns its own button
/// state and must be driven by a single caller at a time.
#[derive(Debug)]
pub struct VisualRotaryEncoder<B, C = SystemClock> {
    pub(crate) bus: B,
    pub(crate) address: I2cAddress,
    pub(crate) clock: C,
    pub(crate) button: ButtonDebouncer,
}

impl<B: RegisterBus> VisualRotaryEncoder<B, SystemClock> {
    /// Creates a driver using the system clock and writes the configured gain.
    pub fn new(bus: B, config: EncoderConfig) -> Result<Self> {
        Self::with_clock(bus, config, SystemClock::new())
    }
}

impl<B: RegisterBus, C: Clock> VisualRotaryEncoder<B, C> {
    // --- Constructors and Info ---

    /// Creates a driver with an explicit clock and writes the configured gain.
    ///
    /// An out-of-range gain is ignored with a warning, like [`write_gain`](Self::write_gain).
    pub fn with_clock(bus: B, config: EncoderConfig, clock: C) -> Result<Self> {
        let address = I2cAddress::new(config.address)?;
        let encoder = VisualRotaryEncoder {
            bus,
            address,
            clock,
            button: ButtonDebouncer::new(config.debounce),
        };
        if !encoder.write_gain(config.gain)? {
            warn!(
                "Ignoring gain {} for encoder at {}: must be {}-{}",
                config.gain,
                address,
                consts::GAIN_MIN,
                consts::GAIN_MAX
            );
        }
        debug!("Encoder at {} ready ({:?})", address, config.debounce);
        Ok(encoder)
    }

    /// The device address this driver talks to.
    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// The button timing parameters in use.
    pub fn debounce_config(&self) -> &DebounceConfig {
        self.button.config()
    }

    /// Returns the bus handle, consuming the driver.
    pub fn release(self) -> B {
        self.bus
    }

    /// Reads the product ID and checks it against the SEN0502 ID.
    ///
    /// A mismatch is reported through [`Identity::matches`], not as an error.
    pub fn identify(&self) -> Result<Identity> {
        let data = self.read_reg(reg::PID_MSB, 2)?;
        let product_id = ProductId(u16::from_be_bytes([data[0], data[1]]));
        let matches = product_id.raw() == consts::EXPECTED_PID;
        if matches {
            debug!("Found {} at {}", product_id, self.address);
        } else {
            warn!(
                "Unexpected product ID 0x{:04X} at {} (expected 0x{:04X})",
                product_id.raw(),
                self.address,
                consts::EXPECTED_PID
            );
        }
        Ok(Identity {
            product_id,
            matches,
        })
    }

    /// Reads product ID, vendor ID, firmware version and bus address in one burst.
    pub fn read_info(&self) -> Result<DeviceInfo> {
        let data = self.read_reg(reg::PID_MSB, reg::INFO_LEN)?;
        Ok(DeviceInfo::decode(&data))
    }

    // --- Encoder Value ---

    /// Reads the encoder count (0-1023).
    pub fn read_counter(&self) -> Result<u16> {
        let data = self.read_reg(reg::COUNT_MSB, 2)?;
        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    /// Sets the encoder count.
    ///
    /// Values above 1023 are ignored: nothing is written and `Ok(false)` is
    /// returned.
    pub fn write_counter(&self, value: u16) -> Result<bool> {
        if value > consts::COUNTER_MAX {
            debug!("Ignoring counter value {} (max {})", value, consts::COUNTER_MAX);
            return Ok(false);
        }
        self.write_reg(reg::COUNT_MSB, &value.to_be_bytes())?;
        Ok(true)
    }

    /// Reads the encoder count scaled to 0.0-1.0.
    pub fn encoder_as_fraction(&self) -> Result<f64> {
        let value = self.read_counter()?;
        Ok((f64::from(value) / f64::from(consts::COUNTER_MAX)).min(1.0))
    }

    // --- Gain ---

    /// Reads the gain coefficient (1-51): 1 lights one LED about every 2.5
    /// turns, 51 lights one LED per detent.
    pub fn read_gain(&self) -> Result<u8> {
        let data = self.read_reg(reg::GAIN, 1)?;
        Ok(data[0])
    }

    /// Sets the gain coefficient. Values outside 1-51 are ignored and
    /// `Ok(false)` is returned.
    pub fn write_gain(&self, value: u8) -> Result<bool> {
        if !(consts::GAIN_MIN..=consts::GAIN_MAX).contains(&value) {
            debug!("Ignoring gain value {}", value);
            return Ok(false);
        }
        self.write_reg(reg::GAIN, &[value])?;
        Ok(true)
    }

    // --- Key Status ---

    /// Checks for a pending key edge and acknowledges it.
    ///
    /// When the register is non-zero it is cleared before `true` is returned,
    /// so the same edge is not seen twice. If the clearing write fails the
    /// error is returned and the edge stays pending in the module.
    pub fn read_key_status(&self) -> Result<bool> {
        let data = self.read_reg(reg::KEY_STATUS, 1)?;
        if data[0] == 0 {
            return Ok(false);
        }
        trace!("Key edge pending on {} (0x{:02X})", self.address, data[0]);
        self.write_reg(reg::KEY_STATUS, &[0])?;
        Ok(true)
    }

    // --- Raw Register Access ---

    fn read_reg(&self, register: u8, length: usize) -> Result<Vec<u8>> {
        let data = self.bus.read_block(self.address, register, length)?;
        if data.len() < length {
            return Err(TransportError::ShortRead {
                address: self.address,
                register,
                expected: length,
                actual: data.len(),
            }
            .into());
        }
        trace!(
            "Read {} register 0x{:02X}: {:02X?}",
            self.address,
            register,
            data
        );
        Ok(data)
    }

    fn write_reg(&self, register: u8, data: &[u8]) -> Result<()> {
        trace!(
            "Write {} register 0x{:02X}: {:02X?}",
            self.address,
            register,
            data
        );
        self.bus.write_block(self.address, register, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_decoding() {
        let pid = ProductId(consts::EXPECTED_PID);
        assert_eq!(pid.sku_family(), SkuFamily::Sen);
        assert_eq!(pid.number(), 502);
        assert_eq!(format!("{pid}"), "SEN0502");

        assert_eq!(ProductId(0x4000 | 42).sku_family(), SkuFamily::Dfr);
        assert_eq!(format!("{}", ProductId(0x4000 | 42)), "DFR0042");
        assert_eq!(ProductId(0x8001).sku_family(), SkuFamily::Tel);
        assert_eq!(ProductId(0xC001).sku_family(), SkuFamily::Unknown);
        assert_eq!(ProductId(0xFFFF).number(), 0x3FFF);
    }

    #[test]
    fn test_firmware_version_decoding() {
        let version = FirmwareVersion(0x0100);
        assert_eq!(version.major(), 0);
        assert_eq!(version.minor(), 1);
        assert_eq!(version.patch(), 0);
        assert_eq!(version.build(), 0);
        assert_eq!(format!("{version}"), "V0.1.0.0");
        assert_eq!(format!("{}", FirmwareVersion(0x1234)), "V1.2.3.4");
    }

    #[test]
    fn test_info_decoding_skips_reserved_byte() {
        let info = DeviceInfo::decode(&[0x01, 0xF6, 0x33, 0x43, 0x01, 0x00, 0xAA, 0x54]);
        assert_eq!(info.product_id, ProductId(0x01F6));
        assert_eq!(info.vendor_id, consts::DFROBOT_VID);
        assert_eq!(info.version, FirmwareVersion(0x0100));
        assert_eq!(info.bus_address, 0x54);
    }

    #[test]
    fn test_config_builder() {
        let config = EncoderConfig::new(0x55)
            .gain(51)
            .poll_interval(Duration::from_millis(20))
            .stuck_timeout(Duration::from_secs(5));
        assert_eq!(config.address, 0x55);
        assert_eq!(config.gain, 51);
        assert_eq!(config.debounce.poll_interval, Duration::from_millis(20));
        assert_eq!(config.debounce.stuck_timeout, Duration::from_secs(5));

        let default = EncoderConfig::default();
        assert_eq!(default.address, 0x54);
        assert_eq!(default.gain, 25);
    }
}
