//! The calibration sweep.
//!
//! For every expected maximum current in the configured range, and for every
//! LSB scale factor, the device is reset, programmed with the resulting
//! calibration and sampled back-to-back [`SAMPLES_PER_TRIAL`] times.

use std::ops::RangeInclusive;

use log::{debug, info, warn};

use crate::calibration::{calibrate, CalibrationResult, CurrentLsb};
use crate::config::SweepConfig;
use crate::device::SensorDevice;
use crate::error::SweepError;
use crate::ina219::config::Ina219Config;
use crate::report::{DataRecord, Record, Reporter, SampleReading};

/// Multiples of the base current LSB tried at each maximum current.
pub const SCALES: RangeInclusive<u8> = 1..=8;

/// Samples taken with no delay between them, to show conversion-to-conversion
/// consistency at a single operating point.
pub const SAMPLES_PER_TRIAL: u8 = 3;

/// Settle time after a reset before the device accepts configuration.
pub const RESET_SETTLE_MS: u32 = 1;

/// Settle time after configuration before the first sample.
pub const CONFIG_SETTLE_MS: u32 = 1;

/// 32 V bus range, /8 gain (±320 mV), 12-bit bus and shunt ADCs, continuous
/// shunt and bus conversion.
pub fn sweep_config_word() -> u16 {
    Ina219Config::default().word()
}

/// A single (maximum current, scale) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialPoint {
    pub max_current_ma: u32,
    pub scale: u8,
}

impl TrialPoint {
    pub fn max_current_a(&self) -> f64 {
        f64::from(self.max_current_ma) / 1000.0
    }

    pub fn scaled_lsb(&self) -> CurrentLsb {
        CurrentLsb::for_max_current(self.max_current_ma).scaled(self.scale)
    }
}

/// Every trial point of `config`, ascending by maximum current then scale.
pub fn trial_points(config: &SweepConfig) -> impl Iterator<Item = TrialPoint> {
    config.max_currents().flat_map(|max_current_ma| {
        SCALES.map(move |scale| TrialPoint {
            max_current_ma,
            scale,
        })
    })
}

/// What a completed sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    /// Maximum-current sections visited.
    pub sections: usize,
    /// Trial points programmed into the device.
    pub trials: usize,
    /// Trial points skipped for calibration overflow.
    pub skipped: usize,
    pub samples: usize,
}

/// A device that has just been reset and programmed for one trial point.
///
/// The only way to get one is [`TrialSession::open`], so every sample is
/// taken from a freshly reset device and no register state from the previous
/// trial can leak into this one.
pub struct TrialSession<'d, D: SensorDevice> {
    device: &'d mut D,
}

impl<'d, D: SensorDevice> TrialSession<'d, D> {
    pub fn open(device: &'d mut D, calibration: u16, config_word: u16) -> Result<Self, D::Error> {
        device.reset()?;
        device.delay(RESET_SETTLE_MS);
        device.set_calibration(calibration)?;
        device.set_config(config_word)?;
        device.delay(CONFIG_SETTLE_MS);
        Ok(Self { device })
    }

    pub fn sample(&mut self) -> Result<SampleReading, D::Error> {
        Ok(SampleReading {
            bus_voltage_mv: self.device.read_bus_voltage()?,
            current_ma: self.device.read_current()?,
            shunt_voltage_mv: self.device.read_shunt_voltage()?,
        })
    }
}

/// Run the sweep described by `config` against `device`, sending every
/// record to `reporter`.
///
/// Calibration overflow skips the affected trial point and is never fatal.
/// Device and reporter errors stop the sweep.
pub fn run_sweep<D, R>(
    config: &SweepConfig,
    device: &mut D,
    reporter: &mut R,
) -> Result<SweepSummary, SweepError<D::Error, R::Error>>
where
    D: SensorDevice,
    R: Reporter,
{
    config.validate()?;
    info!(
        "Sweeping {}..={} mA in {} mA steps over {} Ω",
        config.min_current_ma, config.max_current_ma, config.step_ma, config.shunt_ohms
    );

    let config_word = sweep_config_word();
    let mut summary = SweepSummary::default();
    let mut emit = |record: Record| -> Result<(), SweepError<D::Error, R::Error>> {
        reporter.report(&record).map_err(SweepError::Report)
    };

    for max_current_ma in config.max_currents() {
        let max_current_a = f64::from(max_current_ma) / 1000.0;
        summary.sections += 1;

        emit(Record::SectionHeader {
            max_current_ma,
            max_current_a,
        })?;

        for scale in SCALES {
            let point = TrialPoint {
                max_current_ma,
                scale,
            };
            let scaled_lsb = point.scaled_lsb();

            let calibration = match calibrate(scaled_lsb, config.shunt_ohms) {
                Ok(calibration) => calibration,
                Err(overflow) => {
                    warn!(
                        "Imax={max_current_ma} mA ×{scale}: calibration {} overflows",
                        overflow.calibration_raw
                    );
                    summary.skipped += 1;
                    emit(Record::Skip {
                        max_current_ma,
                        scale,
                        calibration_raw: overflow.calibration_raw,
                    })?;
                    continue;
                }
            };

            debug!(
                "Imax={max_current_ma} mA ×{scale}: CAL={} full scale {:.3} A",
                calibration.calibration_reg,
                calibration.full_scale_current_a()
            );

            let mut session =
                TrialSession::open(device, calibration.calibration_reg, config_word)
                    .map_err(SweepError::Device)?;
            summary.trials += 1;

            for sample_index in 1..=SAMPLES_PER_TRIAL {
                let reading = session.sample().map_err(SweepError::Device)?;
                summary.samples += 1;
                emit(Record::Data(data_record(
                    point,
                    sample_index,
                    &calibration,
                    reading,
                )))?;
            }
        }

        emit(Record::SectionFooter {
            max_current_ma,
            max_current_a,
        })?;
        info!("Finished Imax={max_current_ma} mA");
    }

    info!(
        "Sweep complete: {} sections, {} trials, {} skipped, {} samples",
        summary.sections, summary.trials, summary.skipped, summary.samples
    );
    Ok(summary)
}

fn data_record(
    point: TrialPoint,
    sample_index: u8,
    calibration: &CalibrationResult,
    reading: SampleReading,
) -> DataRecord {
    DataRecord {
        sample_index,
        max_current_ma: point.max_current_ma,
        max_current_a: point.max_current_a(),
        scaled_lsb_a: calibration.current_lsb_a,
        scale: point.scale,
        calibration: calibration.calibration_reg,
        reading,
    }
}
