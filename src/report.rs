//! Sweep records and the sinks that receive them.

use std::io::Write;

/// One sample of the three measurement registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleReading {
    pub bus_voltage_mv: u16,
    pub current_ma: i16,
    pub shunt_voltage_mv: u16,
}

/// A sample taken at a programmed trial point, with the parameters that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRecord {
    /// 1-based index within the trial.
    pub sample_index: u8,
    pub max_current_ma: u32,
    pub max_current_a: f64,
    pub scaled_lsb_a: f64,
    pub scale: u8,
    pub calibration: u16,
    pub reading: SampleReading,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    SectionHeader {
        max_current_ma: u32,
        max_current_a: f64,
    },
    /// The calibration for this point overflows the register; the device was
    /// not touched.
    Skip {
        max_current_ma: u32,
        scale: u8,
        calibration_raw: u32,
    },
    Data(DataRecord),
    SectionFooter {
        max_current_ma: u32,
        max_current_a: f64,
    },
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::SectionHeader {
                max_current_ma,
                max_current_a,
            } => write!(f, "=== Imax={max_current_ma} mA ({max_current_a:.3} A) ==="),
            Record::Skip {
                max_current_ma,
                scale,
                calibration_raw,
            } => write!(
                f,
                "SKIP: Imax={max_current_ma} mA ×{scale} LSB → Calibration value overflow: {calibration_raw}"
            ),
            Record::Data(data) => write!(
                f,
                "DATA: READ{}, Imax={} mA ({:.3} A), LSB={:.9} A, Scale={}, CAL={} (0x{:04X}), Bus={} mV, Current={} mA, Shunt={} mV",
                data.sample_index,
                data.max_current_ma,
                data.max_current_a,
                data.scaled_lsb_a,
                data.scale,
                data.calibration,
                data.calibration,
                data.reading.bus_voltage_mv,
                data.reading.current_ma,
                data.reading.shunt_voltage_mv,
            ),
            Record::SectionFooter {
                max_current_ma,
                max_current_a,
            } => write!(f, "--- END Imax={max_current_ma} mA ({max_current_a:.3} A) ---"),
        }
    }
}

/// Receives sweep records in emission order.
pub trait Reporter {
    type Error;

    fn report(&mut self, record: &Record) -> Result<(), Self::Error>;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    type Error = R::Error;

    fn report(&mut self, record: &Record) -> Result<(), Self::Error> {
        (**self).report(record)
    }
}

/// Collects records in memory.
impl Reporter for Vec<Record> {
    type Error = std::convert::Infallible;

    fn report(&mut self, record: &Record) -> Result<(), Self::Error> {
        self.push(*record);
        Ok(())
    }
}

/// Writes one line per record in the log format `log_parse` reads back.
/// Section footers are followed by an empty line.
pub struct LineReporter<W> {
    out: W,
}

impl<W: Write> LineReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for LineReporter<W> {
    type Error = std::io::Error;

    fn report(&mut self, record: &Record) -> Result<(), Self::Error> {
        writeln!(self.out, "{record}")?;
        if let Record::SectionFooter { .. } = record {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }
}
