//! In-memory stand-in for one or more encoder modules on a shared bus.
//!
//! [`SimulatedBus`] implements [`RegisterBus`] over per-device register files
//! that behave like the module: identity registers are read-only, the
//! counter, key status and gain registers are writable. It can inject button
//! edges and transport failures, and counts transactions so callers can check
//! that rejected writes never reach the bus.

use crate::consts::{self, reg};
use crate::error::TransportError;
use crate::i2c::{I2cAddress, RegisterBus};
use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

const FIRMWARE_VERSION: u16 = 0x0100;

type RegisterFile = [u8; reg::FILE_SIZE];

fn power_on_registers(address: I2cAddress) -> RegisterFile {
    let mut regs = [0u8; reg::FILE_SIZE];
    let [pid_msb, pid_lsb] = consts::EXPECTED_PID.to_be_bytes();
    let [vid_msb, vid_lsb] = consts::DFROBOT_VID.to_be_bytes();
    let [ver_msb, ver_lsb] = FIRMWARE_VERSION.to_be_bytes();
    regs[reg::PID_MSB as usize] = pid_msb;
    regs[reg::PID_LSB as usize] = pid_lsb;
    regs[reg::VID_MSB as usize] = vid_msb;
    regs[reg::VID_LSB as usize] = vid_lsb;
    regs[reg::VERSION_MSB as usize] = ver_msb;
    regs[reg::VERSION_LSB as usize] = ver_lsb;
    regs[reg::ADDRESS as usize] = address.value();
    regs[reg::GAIN as usize] = consts::DEFAULT_GAIN;
    regs
}

fn is_writable(register: usize) -> bool {
    [reg::COUNT_MSB, reg::COUNT_LSB, reg::KEY_STATUS, reg::GAIN]
        .iter()
        .any(|&r| r as usize == register)
}

/// A simulated bus carrying any number of encoder modules.
#[derive(Debug, Default)]
pub struct SimulatedBus {
    devices: RefCell<BTreeMap<I2cAddress, RegisterFile>>,
    fail_next: Cell<usize>,
    fail_writes: Cell<usize>,
    transactions: Cell<usize>,
}

impl SimulatedBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus with one module at `address`.
    pub fn with_device(address: I2cAddress) -> Self {
        let bus = Self::new();
        bus.attach(address);
        bus
    }

    /// Attaches a module in its power-on state, replacing any module already
    /// at `address`.
    pub fn attach(&self, address: I2cAddress) {
        self.devices
            .borrow_mut()
            .insert(address, power_on_registers(address));
    }

    /// Makes the next `count` transactions fail with a NACK.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.set(count);
    }

    /// Makes the next `count` write transactions fail with a NACK, leaving
    /// reads unaffected.
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_writes.set(count);
    }

    /// Number of transactions attempted so far, including failed ones.
    pub fn transactions(&self) -> usize {
        self.transactions.get()
    }

    /// Latches a key edge, as the module does when the button changes state.
    pub fn press_key(&self, address: I2cAddress) {
        self.poke(address, reg::KEY_STATUS, 1);
    }

    /// Current key-status register value.
    pub fn key_status(&self, address: I2cAddress) -> Option<u8> {
        self.peek(address, reg::KEY_STATUS)
    }

    /// Current raw counter register value (as if turned by hand).
    pub fn counter(&self, address: I2cAddress) -> Option<u16> {
        let msb = self.peek(address, reg::COUNT_MSB)?;
        let lsb = self.peek(address, reg::COUNT_LSB)?;
        Some(u16::from_be_bytes([msb, lsb]))
    }

    /// Sets the counter register directly, bypassing range checks.
    pub fn set_counter(&self, address: I2cAddress, value: u16) {
        let [msb, lsb] = value.to_be_bytes();
        self.poke(address, reg::COUNT_MSB, msb);
        self.poke(address, reg::COUNT_LSB, lsb);
    }

    /// Current gain register value.
    pub fn gain(&self, address: I2cAddress) -> Option<u8> {
        self.peek(address, reg::GAIN)
    }

    /// Overwrites any register, including read-only ones.
    pub fn poke(&self, address: I2cAddress, register: u8, value: u8) {
        if let Some(slot) = self
            .devices
            .borrow_mut()
            .get_mut(&address)
            .and_then(|regs| regs.get_mut(register as usize))
        {
            *slot = value;
        }
    }

    /// Reads any register without counting a transaction.
    pub fn peek(&self, address: I2cAddress, register: u8) -> Option<u8> {
        self.devices
            .borrow()
            .get(&address)
            .and_then(|regs| regs.get(register as usize).copied())
    }

    fn begin(&self, address: I2cAddress) -> Result<(), TransportError> {
        self.transactions.set(self.transactions.get() + 1);
        let remaining = self.fail_next.get();
        if remaining > 0 {
            self.fail_next.set(remaining - 1);
            return Err(TransportError::Nack { address });
        }
        if !self.devices.borrow().contains_key(&address) {
            return Err(TransportError::Nack { address });
        }
        Ok(())
    }
}

impl RegisterBus for SimulatedBus {
    fn write_block(
        &self,
        address: I2cAddress,
        register: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        self.begin(address)?;
        let remaining = self.fail_writes.get();
        if remaining > 0 {
            self.fail_writes.set(remaining - 1);
            return Err(TransportError::Nack { address });
        }
        trace!("sim write {} 0x{:02X}: {:02X?}", address, register, data);
        let mut devices = self.devices.borrow_mut();
        if let Some(regs) = devices.get_mut(&address) {
            for (offset, &byte) in data.iter().enumerate() {
                let index = register as usize + offset;
                if index < regs.len() && is_writable(index) {
                    regs[index] = byte;
                }
            }
        }
        Ok(())
    }

    fn read_block(
        &self,
        address: I2cAddress,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.begin(address)?;
        let devices = self.devices.borrow();
        let data = (0..length)
            .map(|offset| {
                devices
                    .get(&address)
                    .and_then(|regs| regs.get(register as usize + offset).copied())
                    .unwrap_or(0)
            })
            .collect();
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_registers_are_read_only() {
        let addr = I2cAddress::new(0x54).unwrap();
        let bus = SimulatedBus::with_device(addr);
        bus.write_block(addr, reg::PID_MSB, &[0xFF, 0xFF]).unwrap();
        assert_eq!(bus.read_block(addr, reg::PID_MSB, 2).unwrap(), vec![0x01, 0xF6]);
        assert_eq!(bus.peek(addr, reg::ADDRESS), Some(0x54));
    }

    #[test]
    fn test_missing_device_nacks() {
        let bus = SimulatedBus::new();
        let addr = I2cAddress::new(0x20).unwrap();
        assert_eq!(
            bus.read_block(addr, reg::GAIN, 1),
            Err(TransportError::Nack { address: addr })
        );
        assert_eq!(bus.transactions(), 1);
    }

    #[test]
    fn test_fault_injection() {
        let addr = I2cAddress::new(0x54).unwrap();
        let bus = SimulatedBus::with_device(addr);
        bus.fail_next(2);
        assert!(bus.read_block(addr, reg::GAIN, 1).is_err());
        assert!(bus.write_block(addr, reg::GAIN, &[3]).is_err());
        assert_eq!(bus.gain(addr), Some(consts::DEFAULT_GAIN));
        assert_eq!(bus.read_block(addr, reg::GAIN, 1).unwrap(), vec![consts::DEFAULT_GAIN]);
    }
}
