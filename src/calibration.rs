//! Calibration register arithmetic for the INA219 family.
//!
//! The device computes `current = shunt_voltage_register × calibration / 4096`,
//! so for a chosen current LSB the calibration register must hold
//! `trunc(0.04096 / (current_lsb × r_shunt))`.

/// Fixed-point scaling constant of the calibration register (datasheet eq. 1).
pub const CALIBRATION_SCALE: f64 = 0.04096;

/// Number of positive counts of the 15-bit (plus sign) current register.
pub const CURRENT_REGISTER_RANGE: f64 = 32768.0;

/// The power register LSB is always 20 × the current LSB.
pub const POWER_LSB_FACTOR: f64 = 20.0;

/// Largest value the 16-bit calibration register can hold.
pub const MAX_CALIBRATION: u16 = u16::MAX;

/// Current represented by one count of the current register, in amperes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentLsb(f64);

impl CurrentLsb {
    /// Base LSB that spreads `max_current_ma` over the full current register.
    pub fn for_max_current(max_current_ma: u32) -> Self {
        let max_current_a = f64::from(max_current_ma) / 1000.0;
        Self(max_current_a / CURRENT_REGISTER_RANGE)
    }

    /// The base LSB multiplied by an integer factor.
    pub fn scaled(self, scale: u8) -> Self {
        Self(self.0 * f64::from(scale))
    }

    pub fn amps(self) -> f64 {
        self.0
    }
}

/// A calibration that fits the register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    pub current_lsb_a: f64,
    pub calibration_reg: u16,
}

impl CalibrationResult {
    pub fn power_lsb_w(&self) -> f64 {
        self.current_lsb_a * POWER_LSB_FACTOR
    }

    /// Largest positive current the current register can express.
    pub fn full_scale_current_a(&self) -> f64 {
        self.current_lsb_a * (CURRENT_REGISTER_RANGE - 1.0)
    }
}

/// The computed register value does not fit in 16 bits.
///
/// `calibration_raw` saturates at `u32::MAX` for non-finite results, which
/// happen when the current LSB is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationOverflow {
    pub calibration_raw: u32,
}

/// Compute the calibration register for `current_lsb` over `shunt_ohms`.
///
/// The overflow check runs on the floored `f64` before any narrowing.
pub fn calibrate(
    current_lsb: CurrentLsb,
    shunt_ohms: f64,
) -> Result<CalibrationResult, CalibrationOverflow> {
    let raw = (CALIBRATION_SCALE / (current_lsb.amps() * shunt_ohms)).floor();

    if raw.is_finite() && raw <= f64::from(MAX_CALIBRATION) {
        Ok(CalibrationResult {
            current_lsb_a: current_lsb.amps(),
            calibration_reg: raw as u16,
        })
    } else {
        Err(CalibrationOverflow {
            // `as` saturates: infinities become u32::MAX.
            calibration_raw: raw as u32,
        })
    }
}

/// Current LSB implied by a calibration value already in the register.
pub(crate) fn lsb_from_register(calibration: u16, shunt_ohms: f64) -> Option<CurrentLsb> {
    (calibration != 0)
        .then(|| CurrentLsb(CALIBRATION_SCALE / (f64::from(calibration) * shunt_ohms)))
}
