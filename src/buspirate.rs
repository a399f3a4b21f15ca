use std::io::{Read, Write};
use std::{marker::PhantomData, time::Duration};

use bit_field::BitField;
use log::info;
use serialport::SerialPort;

use crate::modes::{self, ActiveMode, Bitbang, I2c, Modes};
use crate::transfer;
use crate::Error;

pub const BAUD_RATE: u32 = 115_200;

/// HAL wrapper
pub struct BusPirate<M: ActiveMode, P = Box<dyn SerialPort>> {
    _mode: PhantomData<M>,
    port: P,
}

/// Consume $this and return it with the new mode type.
macro_rules! with_mode {
    ($this:ident, $mode:ty) => {{
        let Self { _mode, port } = $this;
        BusPirate::<$mode, _> {
            _mode: PhantomData,
            port,
        }
    }};
}

/// Open the Bus Pirate on the serial port at `address` and put it into
/// bitbang mode.
pub fn open(address: &str) -> Result<BusPirate<Bitbang>, Error> {
    let serial_port = serialport::new(address, BAUD_RATE)
        .timeout(Duration::from_secs(1))
        .open()?;
    info!("Opened {address} at {BAUD_RATE} baud");
    BusPirate::from_port(serial_port)
}

/// I2C clock rates the binary I2C mode supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cSpeed {
    Khz5,
    Khz50,
    Khz100,
    Khz400,
}

impl I2cSpeed {
    fn register_value(self) -> u8 {
        match self {
            I2cSpeed::Khz5 => 0b00,
            I2cSpeed::Khz50 => 0b01,
            I2cSpeed::Khz100 => 0b10,
            I2cSpeed::Khz400 => 0b11,
        }
    }
}

/// Power supply, pull-up and pin states, all off by default.
#[derive(Debug, Clone, Copy, Default, bon::Builder)]
pub struct Peripherals {
    #[builder(default)]
    pub power: bool,
    #[builder(default)]
    pub pullups: bool,
    #[builder(default)]
    pub aux: bool,
    #[builder(default)]
    pub cs: bool,
}

impl Peripherals {
    fn bits(&self) -> u8 {
        let mut bits = 0u8;
        bits.set_bit(3, self.power);
        bits.set_bit(2, self.pullups);
        bits.set_bit(1, self.aux);
        bits.set_bit(0, self.cs);
        bits
    }
}

impl<M: ActiveMode, P: Read + Write> BusPirate<M, P> {
    pub(crate) fn port(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn mode(&self) -> Modes {
        M::MODE
    }
}

impl<P: Read + Write> BusPirate<Bitbang, P> {
    /// Drive the Bus Pirate on `port` into bitbang mode.
    pub fn from_port(mut port: P) -> Result<Self, Error> {
        transfer::enter_bitbang(&mut port)?;
        Ok(BusPirate {
            _mode: PhantomData,
            port,
        })
    }

    /// Put the Bus Pirate into I2C mode.
    pub fn enter_i2c_mode(mut self, speed: I2cSpeed) -> Result<BusPirate<I2c, P>, Error> {
        transfer::enter_i2c(&mut self.port)?;
        transfer::set_speed(&mut self.port, speed.register_value())?;
        info!("{} mode at {speed:?}", Modes::I2c.name());
        Ok(with_mode!(self, I2c))
    }

    /// Leave binary mode for the user terminal and give back the port.
    pub fn reset(mut self) -> Result<P, Error> {
        transfer::leave_binary_mode(&mut self.port)?;
        Ok(self.port)
    }
}

impl<P: Read + Write> BusPirate<modes::I2c, P> {
    pub fn configure_peripherals(&mut self, peripherals: Peripherals) -> Result<(), Error> {
        info!("Peripherals: {peripherals:?}");
        transfer::set_peripherals(&mut self.port, peripherals.bits())
    }

    pub fn exit(mut self) -> Result<BusPirate<Bitbang, P>, Error> {
        transfer::exit_to_bitbang(&mut self.port)?;
        Ok(with_mode!(self, Bitbang))
    }
}
