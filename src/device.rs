use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::ina219::Ina219;

/// The operations the sweep needs from a current-sense device.
///
/// Register access is fallible so a real bus can report I/O failures; the
/// settle delay is not.
pub trait SensorDevice {
    type Error;

    /// Return the device to its power-on defaults.
    fn reset(&mut self) -> Result<(), Self::Error>;

    fn set_calibration(&mut self, value: u16) -> Result<(), Self::Error>;

    fn set_config(&mut self, word: u16) -> Result<(), Self::Error>;

    /// Bus voltage in millivolts.
    fn read_bus_voltage(&mut self) -> Result<u16, Self::Error>;

    /// Signed current in milliamps.
    fn read_current(&mut self) -> Result<i16, Self::Error>;

    /// Shunt voltage in millivolts.
    fn read_shunt_voltage(&mut self) -> Result<u16, Self::Error>;

    /// Block for `ms` milliseconds.
    fn delay(&mut self, ms: u32);
}

impl<I2C, D> SensorDevice for Ina219<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn reset(&mut self) -> Result<(), Self::Error> {
        Ina219::reset(self)
    }

    fn set_calibration(&mut self, value: u16) -> Result<(), Self::Error> {
        Ina219::set_calibration(self, value)
    }

    fn set_config(&mut self, word: u16) -> Result<(), Self::Error> {
        Ina219::set_config(self, word)
    }

    fn read_bus_voltage(&mut self) -> Result<u16, Self::Error> {
        self.bus_voltage_mv()
    }

    fn read_current(&mut self) -> Result<i16, Self::Error> {
        self.current_ma()
    }

    fn read_shunt_voltage(&mut self) -> Result<u16, Self::Error> {
        self.shunt_voltage_mv()
    }

    fn delay(&mut self, ms: u32) {
        self.delay_ms(ms);
    }
}
