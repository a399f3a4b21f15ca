/// Errors raised while talking to the Bus Pirate.
#[derive(Debug)]
pub enum Error {
    SerialPort(serialport::Error),
    Io(std::io::Error),
    /// The Bus Pirate never answered the bitbang reset with `BBIO1`.
    BitbangTimeout,
    /// A mode switch answered with something other than the expected mode id.
    UnexpectedModeId {
        expected: &'static str,
        received: Vec<u8>,
    },
    /// A command answered with a status byte other than `0x01`.
    CommandFailed { command: u8, status: u8 },
    /// The addressed target (or a data byte) was not acknowledged.
    Nack,
    /// A single write-then-read transfer is limited to 4096 bytes each way.
    TransferTooLong(usize),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serialport::Error> for Error {
    fn from(value: serialport::Error) -> Self {
        Self::SerialPort(value)
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self {
            Error::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            _ => ErrorKind::Other,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SerialPort(e) => write!(f, "serial port error: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::BitbangTimeout => write!(f, "Bus Pirate did not enter bitbang mode"),
            Error::UnexpectedModeId { expected, received } => write!(
                f,
                "expected mode id {expected:?}, received {:?}",
                String::from_utf8_lossy(received)
            ),
            Error::CommandFailed { command, status } => {
                write!(f, "command {command:#04x} failed with status {status:#04x}")
            }
            Error::Nack => write!(f, "I2C target did not acknowledge"),
            Error::TransferTooLong(n) => write!(f, "transfer of {n} bytes exceeds 4096"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SerialPort(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A [`SweepConfig`](crate::SweepConfig) that breaks one of its invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveShunt(f64),
    ZeroStep,
    InvertedRange { min_ma: u32, max_ma: u32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NonPositiveShunt(ohms) => {
                write!(f, "shunt resistance must be positive, got {ohms} Ω")
            }
            ConfigError::ZeroStep => write!(f, "current step must be greater than zero"),
            ConfigError::InvertedRange { min_ma, max_ma } => {
                write!(f, "minimum current {min_ma} mA exceeds maximum {max_ma} mA")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Fatal sweep failures. Calibration overflow is not one of them: it only
/// skips the affected trial point.
#[derive(Debug)]
pub enum SweepError<DeviceError, ReportError> {
    Config(ConfigError),
    Device(DeviceError),
    Report(ReportError),
}

impl<D, R> From<ConfigError> for SweepError<D, R> {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl<D: std::fmt::Display, R: std::fmt::Display> std::fmt::Display for SweepError<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepError::Config(e) => write!(f, "invalid sweep configuration: {e}"),
            SweepError::Device(e) => write!(f, "sensor device error: {e}"),
            SweepError::Report(e) => write!(f, "reporter error: {e}"),
        }
    }
}

impl<D, R> std::error::Error for SweepError<D, R>
where
    D: std::error::Error + 'static,
    R: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Config(e) => Some(e),
            SweepError::Device(e) => Some(e),
            SweepError::Report(e) => Some(e),
        }
    }
}

/// A tagged log line whose fields could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: String,
    pub field: &'static str,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed {} in line {:?}", self.field, self.line)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn sweep_error_shows_and_chains_inner_errors() {
        let err: SweepError<Error, std::io::Error> = SweepError::Device(Error::Nack);
        assert_eq!(
            err.to_string(),
            "sensor device error: I2C target did not acknowledge"
        );
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some(Error::Nack.to_string())
        );

        let err: SweepError<Error, std::io::Error> = SweepError::Report(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdout closed",
        ));
        assert_eq!(err.to_string(), "reporter error: stdout closed");
        assert!(err.source().is_some());
    }
}
