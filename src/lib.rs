//! Calibration sweep for INA219-class current-sense amplifiers.
//!
//! [`run_sweep`] walks a range of expected maximum currents, derives the
//! calibration register for each current LSB multiple, programs a
//! [`SensorDevice`] and reports three back-to-back samples per trial point.
//! The [`Ina219`] driver works over any `embedded-hal` I2C bus; on a host the
//! bus is a Bus Pirate reached through [`open`].

mod buspirate;
pub mod calibration;
mod config;
mod device;
mod eh_i2c;
mod error;
pub mod ina219;
pub mod log_parse;
pub mod modes;
mod report;
pub mod sweep;
mod transfer;

pub use buspirate::{open, BusPirate, I2cSpeed, Peripherals};
pub use config::SweepConfig;
pub use device::SensorDevice;
pub use error::{ConfigError, Error, ParseError, SweepError};
pub use ina219::Ina219;
pub use report::{DataRecord, LineReporter, Record, Reporter, SampleReading};
pub use sweep::{run_sweep, trial_points, SweepSummary, TrialPoint, TrialSession};
