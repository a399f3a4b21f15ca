//! The INA219 configuration register (0x00).
//!
//! ```text
//! bit  15   14   13    12 11  10 .. 7  6 .. 3  2 .. 0
//!      RST  -    BRNG  PG      BADC     SADC    MODE
//! ```

use std::ops::Range;

use bit_field::BitField;

const RESET_BIT: usize = 15;
const BUS_RANGE_BIT: usize = 13;
const GAIN_BITS: Range<usize> = 11..13;
const BUS_ADC_BITS: Range<usize> = 7..11;
const SHUNT_ADC_BITS: Range<usize> = 3..7;
const MODE_BITS: Range<usize> = 0..3;

/// Configuration word that triggers a power-on reset.
pub const RESET_WORD: u16 = 1 << RESET_BIT;

/// Full-scale bus voltage range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusVoltageRange {
    V16,
    V32,
}

impl BusVoltageRange {
    fn register_value(self) -> bool {
        matches!(self, Self::V32)
    }
}

/// Shunt PGA gain and the shunt voltage range it allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    /// ±40 mV
    Div1,
    /// ±80 mV
    Div2,
    /// ±160 mV
    Div4,
    /// ±320 mV
    Div8,
}

impl Gain {
    fn register_value(self) -> u16 {
        match self {
            Gain::Div1 => 0b00,
            Gain::Div2 => 0b01,
            Gain::Div4 => 0b10,
            Gain::Div8 => 0b11,
        }
    }
}

/// ADC resolution or averaging, shared by the bus and shunt ADC fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcResolution {
    Bits9,
    Bits10,
    Bits11,
    /// 12 bit, single sample, 532 µs conversion.
    Bits12,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
    Samples32,
    Samples64,
    Samples128,
}

impl AdcResolution {
    fn register_value(self) -> u16 {
        match self {
            AdcResolution::Bits9 => 0b0000,
            AdcResolution::Bits10 => 0b0001,
            AdcResolution::Bits11 => 0b0010,
            AdcResolution::Bits12 => 0b0011,
            AdcResolution::Samples2 => 0b1001,
            AdcResolution::Samples4 => 0b1010,
            AdcResolution::Samples8 => 0b1011,
            AdcResolution::Samples16 => 0b1100,
            AdcResolution::Samples32 => 0b1101,
            AdcResolution::Samples64 => 0b1110,
            AdcResolution::Samples128 => 0b1111,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    PowerDown,
    ShuntTriggered,
    BusTriggered,
    ShuntAndBusTriggered,
    AdcOff,
    ShuntContinuous,
    BusContinuous,
    ShuntAndBusContinuous,
}

impl OperatingMode {
    fn register_value(self) -> u16 {
        match self {
            OperatingMode::PowerDown => 0b000,
            OperatingMode::ShuntTriggered => 0b001,
            OperatingMode::BusTriggered => 0b010,
            OperatingMode::ShuntAndBusTriggered => 0b011,
            OperatingMode::AdcOff => 0b100,
            OperatingMode::ShuntContinuous => 0b101,
            OperatingMode::BusContinuous => 0b110,
            OperatingMode::ShuntAndBusContinuous => 0b111,
        }
    }
}

/// The fields of the configuration register, defaulting to the power-on state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bon::Builder)]
pub struct Ina219Config {
    #[builder(default = BusVoltageRange::V32)]
    pub bus_voltage_range: BusVoltageRange,
    #[builder(default = Gain::Div8)]
    pub gain: Gain,
    #[builder(default = AdcResolution::Bits12)]
    pub bus_adc: AdcResolution,
    #[builder(default = AdcResolution::Bits12)]
    pub shunt_adc: AdcResolution,
    #[builder(default = OperatingMode::ShuntAndBusContinuous)]
    pub mode: OperatingMode,
}

impl Default for Ina219Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Ina219Config {
    pub fn word(&self) -> u16 {
        let mut word = 0u16;
        word.set_bit(BUS_RANGE_BIT, self.bus_voltage_range.register_value());
        word.set_bits(GAIN_BITS, self.gain.register_value());
        word.set_bits(BUS_ADC_BITS, self.bus_adc.register_value());
        word.set_bits(SHUNT_ADC_BITS, self.shunt_adc.register_value());
        word.set_bits(MODE_BITS, self.mode.register_value());
        word
    }
}
