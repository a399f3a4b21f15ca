//! Blocking INA219 driver over `embedded-hal` 1.0.

pub mod config;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};
use log::debug;

use crate::calibration::{self, CurrentLsb};
use config::RESET_WORD;

/// Address with A0 and A1 tied to ground.
pub const DEFAULT_ADDRESS: SevenBitAddress = 0x40;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    Config = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
}

impl Register {
    fn addr(self) -> u8 {
        self as u8
    }
}

pub struct Ina219<I2C, D> {
    i2c: I2C,
    delay: D,
    address: SevenBitAddress,
    shunt_ohms: f64,
    /// Derived from the last calibration written; the device forgets it on reset.
    current_lsb: Option<CurrentLsb>,
}

impl<I2C, D> Ina219<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, address: SevenBitAddress, shunt_ohms: f64) -> Self {
        Self {
            i2c,
            delay,
            address,
            shunt_ohms,
            current_lsb: None,
        }
    }

    /// Give back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    pub fn current_lsb(&self) -> Option<CurrentLsb> {
        self.current_lsb
    }

    pub fn write_register(&mut self, register: Register, value: u16) -> Result<(), I2C::Error> {
        debug!("INA219 write {register:?} = {value:#06x}");
        let [msb, lsb] = value.to_be_bytes();
        self.i2c.write(self.address, &[register.addr(), msb, lsb])
    }

    pub fn read_register(&mut self, register: Register) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register.addr()], &mut buf)?;
        let value = u16::from_be_bytes(buf);
        debug!("INA219 read {register:?} = {value:#06x}");
        Ok(value)
    }

    /// Power-on reset. Every register, calibration included, returns to default.
    pub fn reset(&mut self) -> Result<(), I2C::Error> {
        self.current_lsb = None;
        self.write_register(Register::Config, RESET_WORD)
    }

    pub fn set_calibration(&mut self, value: u16) -> Result<(), I2C::Error> {
        self.write_register(Register::Calibration, value)?;
        self.current_lsb = calibration::lsb_from_register(value, self.shunt_ohms);
        Ok(())
    }

    pub fn set_config(&mut self, word: u16) -> Result<(), I2C::Error> {
        self.write_register(Register::Config, word)
    }

    /// Bus voltage in millivolts. The low three bits are status flags.
    pub fn bus_voltage_mv(&mut self) -> Result<u16, I2C::Error> {
        let raw = self.read_register(Register::BusVoltage)?;
        Ok((raw >> 3) * 4)
    }

    /// Shunt voltage in whole millivolts (register LSB is 10 µV).
    pub fn shunt_voltage_mv(&mut self) -> Result<u16, I2C::Error> {
        let raw = self.read_register(Register::ShuntVoltage)?;
        Ok(raw / 100)
    }

    /// Current in milliamps, scaled by the active calibration. Reads as 0
    /// while the device is uncalibrated.
    pub fn current_ma(&mut self) -> Result<i16, I2C::Error> {
        let raw = self.read_register(Register::Current)? as i16;
        let Some(lsb) = self.current_lsb else {
            return Ok(0);
        };
        let milliamps = (f64::from(raw) * lsb.amps() * 1000.0).round();
        // Float to int `as` saturates.
        Ok(milliamps as i16)
    }

    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
