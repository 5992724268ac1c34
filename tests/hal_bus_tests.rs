//! Tests for the `embedded-hal` bus adapter.
//!
//! A fake I2C controller emulates the module's register pointer so the
//! driver can be exercised end to end through `HalBus`.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use visual_rotary_encoder::{
    EncoderConfig, Error, HalBus, I2cAddress, ManualClock, PollStatus, RegisterBus,
    TransportError, VisualRotaryEncoder,
};

/// Register-pointer I2C target: the first written byte selects the register,
/// further bytes are written from there, reads continue from the pointer.
struct FakeI2c {
    address: u8,
    regs: [u8; 12],
    pointer: usize,
    frames: Vec<Vec<u8>>,
    fail_with: Option<ErrorKind>,
}

impl FakeI2c {
    fn new(address: u8) -> Self {
        let mut regs = [0u8; 12];
        regs[..8].copy_from_slice(&[0x01, 0xF6, 0x33, 0x43, 0x01, 0x00, 0x00, address]);
        regs[0x0B] = 25;
        Self {
            address,
            regs,
            pointer: 0,
            frames: Vec::new(),
            fail_with: None,
        }
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if let Some(kind) = self.fail_with {
            return Err(kind);
        }
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.frames.push(bytes.to_vec());
                    if let Some((&register, data)) = bytes.split_first() {
                        self.pointer = register as usize;
                        for &byte in data {
                            if let Some(slot) = self.regs.get_mut(self.pointer) {
                                *slot = byte;
                            }
                            self.pointer += 1;
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.regs.get(self.pointer).copied().unwrap_or(0);
                        self.pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[test]
fn test_driver_over_hal_bus() {
    let _ = env_logger::builder().is_test(true).try_init();
    let bus = HalBus::new(FakeI2c::new(0x54));
    let clock = ManualClock::new();
    let mut encoder =
        VisualRotaryEncoder::with_clock(&bus, EncoderConfig::new(0x54).gain(40), &clock).unwrap();

    assert!(encoder.identify().unwrap().matches);
    assert_eq!(encoder.read_info().unwrap().bus_address, 0x54);
    assert_eq!(encoder.read_gain().unwrap(), 40);

    assert!(encoder.write_counter(0x2AB).unwrap());
    assert_eq!(encoder.read_counter().unwrap(), 0x2AB);

    assert_eq!(encoder.poll().unwrap(), PollStatus::Idle);

    let fake = bus.into_inner();
    // Gain write, then big-endian counter write as one frame.
    assert!(fake.frames.contains(&vec![0x0B, 40]));
    assert!(fake.frames.contains(&vec![0x08, 0x02, 0xAB]));
}

#[test]
fn test_key_edge_is_acknowledged_over_hal_bus() {
    let mut fake = FakeI2c::new(0x54);
    fake.regs[0x0A] = 1;
    let bus = HalBus::new(fake);
    let addr = I2cAddress::new(0x54).unwrap();

    let clock = ManualClock::new();
    let mut encoder =
        VisualRotaryEncoder::with_clock(&bus, EncoderConfig::new(0x54), &clock).unwrap();
    assert_eq!(encoder.poll().unwrap(), PollStatus::Pressed);
    assert_eq!(bus.read_block(addr, 0x0A, 1).unwrap(), vec![0]);
}

#[test]
fn test_hal_errors_are_mapped() {
    let bus = HalBus::new(FakeI2c::new(0x54));
    let wrong = I2cAddress::new(0x22).unwrap();
    assert_eq!(
        bus.read_block(wrong, 0x00, 2),
        Err(TransportError::Nack { address: wrong })
    );

    let mut fake = FakeI2c::new(0x54);
    fake.fail_with = Some(ErrorKind::ArbitrationLoss);
    let bus = HalBus::new(fake);
    let clock = ManualClock::new();
    let result = VisualRotaryEncoder::with_clock(&bus, EncoderConfig::new(0x54), &clock);
    assert!(matches!(
        result,
        Err(Error::Transport(TransportError::ArbitrationLost { .. }))
    ));
}
