use crate::error::ConfigError;

pub const DEFAULT_SHUNT_OHMS: f64 = 0.1;
pub const DEFAULT_MIN_CURRENT_MA: u32 = 205;
pub const DEFAULT_MAX_CURRENT_MA: u32 = 3200;
pub const DEFAULT_STEP_MA: u32 = 5;

/// Range of expected maximum currents to sweep, and the shunt they flow through.
///
/// ```
/// use ina219_sweep::SweepConfig;
///
/// let config = SweepConfig::builder()
///     .min_current_ma(400)
///     .max_current_ma(500)
///     .build();
/// assert_eq!(config.step_ma, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, bon::Builder)]
pub struct SweepConfig {
    #[builder(default = DEFAULT_SHUNT_OHMS)]
    pub shunt_ohms: f64,
    #[builder(default = DEFAULT_MIN_CURRENT_MA)]
    pub min_current_ma: u32,
    #[builder(default = DEFAULT_MAX_CURRENT_MA)]
    pub max_current_ma: u32,
    #[builder(default = DEFAULT_STEP_MA)]
    pub step_ma: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Also rejects NaN.
        if !(self.shunt_ohms > 0.0 && self.shunt_ohms.is_finite()) {
            return Err(ConfigError::NonPositiveShunt(self.shunt_ohms));
        }
        if self.step_ma == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.min_current_ma > self.max_current_ma {
            return Err(ConfigError::InvertedRange {
                min_ma: self.min_current_ma,
                max_ma: self.max_current_ma,
            });
        }
        Ok(())
    }

    /// Every expected maximum current in the sweep, ascending.
    pub fn max_currents(&self) -> impl Iterator<Item = u32> {
        let max = self.max_current_ma;
        let step = self.step_ma;
        std::iter::successors(Some(self.min_current_ma), move |&ma| {
            ma.checked_add(step).filter(|&next| next <= max)
        })
        .take_while(move |&ma| ma <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_bench_setup() {
        let config = SweepConfig::default();
        assert_eq!(config.shunt_ohms, 0.1);
        assert_eq!(config.min_current_ma, 205);
        assert_eq!(config.max_current_ma, 3200);
        assert_eq!(config.step_ma, 5);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_broken_invariants() {
        let zero_shunt = SweepConfig::builder().shunt_ohms(0.0).build();
        assert_eq!(zero_shunt.validate(), Err(ConfigError::NonPositiveShunt(0.0)));

        let nan_shunt = SweepConfig::builder().shunt_ohms(f64::NAN).build();
        assert!(matches!(
            nan_shunt.validate(),
            Err(ConfigError::NonPositiveShunt(_))
        ));

        let zero_step = SweepConfig::builder().step_ma(0).build();
        assert_eq!(zero_step.validate(), Err(ConfigError::ZeroStep));

        let inverted = SweepConfig::builder()
            .min_current_ma(300)
            .max_current_ma(200)
            .build();
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::InvertedRange {
                min_ma: 300,
                max_ma: 200
            })
        );
    }

    #[test]
    fn max_currents_are_inclusive() {
        let config = SweepConfig::builder()
            .min_current_ma(205)
            .max_current_ma(220)
            .build();
        assert_eq!(
            config.max_currents().collect::<Vec<_>>(),
            vec![205, 210, 215, 220]
        );
    }

    #[test]
    fn max_currents_stop_before_passing_max() {
        let config = SweepConfig::builder()
            .min_current_ma(200)
            .max_current_ma(212)
            .build();
        assert_eq!(config.max_currents().collect::<Vec<_>>(), vec![200, 205, 210]);
    }

    #[test]
    fn max_currents_do_not_wrap() {
        let config = SweepConfig::builder()
            .min_current_ma(u32::MAX - 1)
            .max_current_ma(u32::MAX)
            .step_ma(5)
            .build();
        assert_eq!(config.max_currents().collect::<Vec<_>>(), vec![u32::MAX - 1]);
    }

    #[test]
    fn default_sweep_has_600_sections() {
        assert_eq!(SweepConfig::default().max_currents().count(), 600);
    }
}
