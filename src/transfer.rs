//! Command/response primitives of the Bus Pirate binary ("bitbang") protocol.
//!
//! Every function here assumes the Bus Pirate is already in the mode the
//! command belongs to; the typestate in [`crate::buspirate`] enforces that.

use std::io::{ErrorKind, Read, Write};

use log::{debug, trace};

use crate::modes::Modes;
use crate::Error;

/// Commands shared by bitbang and I2C mode.
const RESET_TO_BITBANG: u8 = 0x00;
const ENTER_I2C: u8 = 0x02;
const LEAVE_BINARY_MODE: u8 = 0x0F;

/// I2C mode commands.
const I2C_START: u8 = 0x02;
const I2C_STOP: u8 = 0x03;
const I2C_READ_BYTE: u8 = 0x04;
const I2C_ACK: u8 = 0x06;
const I2C_NACK: u8 = 0x07;
const I2C_WRITE_THEN_READ: u8 = 0x08;
const I2C_BULK_WRITE: u8 = 0x10;
const I2C_PERIPHERALS: u8 = 0x40;
const I2C_SPEED: u8 = 0x60;

const SUCCESS: u8 = 0x01;
const ACK: u8 = 0x00;

/// The Bus Pirate needs up to 20 zero bytes to leave its terminal.
const BITBANG_ATTEMPTS: usize = 20;
const BULK_WRITE_MAX: usize = 16;
const WRITE_THEN_READ_MAX: usize = 4096;

fn read_byte(mut port: impl Read) -> Result<u8, Error> {
    let mut byte = [0u8];
    port.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Send a single-byte command that answers `0x01` on success.
fn command(mut port: impl Read + Write, command: u8) -> Result<(), Error> {
    trace!("BP command {command:#04x}");
    port.write_all(&[command])?;
    match read_byte(&mut port)? {
        SUCCESS => Ok(()),
        status => Err(Error::CommandFailed { command, status }),
    }
}

fn expect_mode_id(mut port: impl Read, mode: Modes) -> Result<(), Error> {
    let expected = mode.id();
    let mut received = vec![0u8; expected.len()];
    port.read_exact(&mut received)?;
    if received == expected.as_bytes() {
        debug!("Bus Pirate in {} mode", mode.name());
        Ok(())
    } else {
        Err(Error::UnexpectedModeId { expected, received })
    }
}

/// Leave the user terminal (or any binary mode) for raw bitbang mode.
///
/// A new zero is only sent once the port has gone quiet, so every id the
/// Bus Pirate sends back is consumed here and none is left for the next
/// mode switch to trip over.
pub(crate) fn enter_bitbang(mut port: impl Read + Write) -> Result<(), Error> {
    let expected = Modes::Bitbang.id().as_bytes();
    let mut received = Vec::new();
    let mut buf = vec![0u8; expected.len()];

    for attempt in 1..=BITBANG_ATTEMPTS {
        port.write_all(&[RESET_TO_BITBANG])?;
        port.flush()?;
        loop {
            match port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
                // Nothing yet: the terminal swallows the first few zeros.
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
            if received.ends_with(expected) {
                debug!("Bitbang mode after {attempt} attempts");
                return Ok(());
            }
            if !ends_with_partial_id(&received, expected) {
                break;
            }
        }
    }
    Err(Error::BitbangTimeout)
}

/// Whether `received` ends part of the way through `id`.
fn ends_with_partial_id(received: &[u8], id: &[u8]) -> bool {
    (1..id.len()).any(|len| received.ends_with(&id[..len]))
}

pub(crate) fn leave_binary_mode(port: impl Read + Write) -> Result<(), Error> {
    command(port, LEAVE_BINARY_MODE)
}

pub(crate) fn enter_i2c(mut port: impl Read + Write) -> Result<(), Error> {
    port.write_all(&[ENTER_I2C])?;
    expect_mode_id(port, Modes::I2c)
}

/// From any protocol mode back to bitbang.
pub(crate) fn exit_to_bitbang(mut port: impl Read + Write) -> Result<(), Error> {
    port.write_all(&[RESET_TO_BITBANG])?;
    expect_mode_id(port, Modes::Bitbang)
}

pub(crate) fn set_speed(port: impl Read + Write, speed_code: u8) -> Result<(), Error> {
    command(port, I2C_SPEED | (speed_code & 0b11))
}

pub(crate) fn set_peripherals(port: impl Read + Write, bits: u8) -> Result<(), Error> {
    command(port, I2C_PERIPHERALS | (bits & 0x0F))
}

pub(crate) fn start(port: impl Read + Write) -> Result<(), Error> {
    command(port, I2C_START)
}

pub(crate) fn stop(port: impl Read + Write) -> Result<(), Error> {
    command(port, I2C_STOP)
}

pub(crate) fn ack(port: impl Read + Write) -> Result<(), Error> {
    command(port, I2C_ACK)
}

pub(crate) fn nack(port: impl Read + Write) -> Result<(), Error> {
    command(port, I2C_NACK)
}

/// Clock one byte in from the bus. The caller must ACK or NACK it.
pub(crate) fn read_bus_byte(mut port: impl Read + Write) -> Result<u8, Error> {
    port.write_all(&[I2C_READ_BYTE])?;
    read_byte(port)
}

/// Write bytes with no start or stop, 16 at a time. Each byte is answered
/// with its ACK bit.
pub(crate) fn bulk_write(mut port: impl Read + Write, bytes: &[u8]) -> Result<(), Error> {
    for chunk in bytes.chunks(BULK_WRITE_MAX) {
        command(&mut port, I2C_BULK_WRITE | (chunk.len() - 1) as u8)?;
        port.write_all(chunk)?;
        let mut acks = [0u8; BULK_WRITE_MAX];
        port.read_exact(&mut acks[..chunk.len()])?;
        if acks[..chunk.len()].iter().any(|&bit| bit != ACK) {
            return Err(Error::Nack);
        }
    }
    Ok(())
}

/// Start, write `write` (address byte first), repeated start and read into
/// `read` if it is not empty, stop. The Bus Pirate sets the read bit of the
/// address itself.
pub(crate) fn write_then_read(
    mut port: impl Read + Write,
    write: &[u8],
    read: &mut [u8],
) -> Result<(), Error> {
    for len in [write.len(), read.len()] {
        if len > WRITE_THEN_READ_MAX {
            return Err(Error::TransferTooLong(len));
        }
    }

    let mut request = Vec::with_capacity(5 + write.len());
    request.push(I2C_WRITE_THEN_READ);
    request.extend_from_slice(&(write.len() as u16).to_be_bytes());
    request.extend_from_slice(&(read.len() as u16).to_be_bytes());
    request.extend_from_slice(write);
    port.write_all(&request)?;

    match read_byte(&mut port)? {
        SUCCESS => {
            port.read_exact(read)?;
            Ok(())
        }
        _ => Err(Error::Nack),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};

    use super::*;

    /// A serial port with a scripted reply stream.
    #[derive(Default)]
    pub(crate) struct FakePort {
        pub(crate) replies: VecDeque<u8>,
        pub(crate) written: Vec<u8>,
    }

    impl FakePort {
        pub(crate) fn replying(replies: &[u8]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                written: Vec::new(),
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.replies.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
            }
            let n = buf.len().min(self.replies.len());
            for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bitbang_entry_after_reply() {
        let mut port = FakePort::replying(b"BBIO1");
        enter_bitbang(&mut port).unwrap();
        assert_eq!(port.written, [0x00]);
    }

    #[test]
    fn bitbang_entry_gives_up() {
        let mut port = FakePort::default();
        assert!(matches!(
            enter_bitbang(&mut port),
            Err(Error::BitbangTimeout)
        ));
        assert_eq!(port.written, [0x00; 20]);
    }

    /// Answers every zero byte with `BBIO1`, handing it out a few bytes
    /// per read like a slow USB serial adapter.
    #[derive(Default)]
    struct TricklingPort {
        pending: VecDeque<u8>,
        zeros: usize,
    }

    impl Read for TricklingPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
            }
            let n = buf.len().min(self.pending.len()).min(3);
            for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for TricklingPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            for &byte in buf {
                if byte == RESET_TO_BITBANG {
                    self.zeros += 1;
                    self.pending.extend(b"BBIO1");
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bitbang_entry_waits_for_split_reply() {
        let mut port = TricklingPort::default();
        enter_bitbang(&mut port).unwrap();
        assert_eq!(port.zeros, 1);
        assert!(port.pending.is_empty());
    }

    #[test]
    fn bitbang_entry_skips_leading_noise() {
        let mut port = FakePort::replying(b"xyBBIO1");
        enter_bitbang(&mut port).unwrap();
        assert_eq!(port.written, [0x00]);
        assert!(port.replies.is_empty());
    }

    #[test]
    fn partial_id_detection() {
        assert!(ends_with_partial_id(b"xBBI", b"BBIO1"));
        assert!(!ends_with_partial_id(b"BBIO1", b"BBIO1"));
        assert!(!ends_with_partial_id(b"", b"BBIO1"));
    }

    #[test]
    fn i2c_mode_id_is_checked() {
        let mut port = FakePort::replying(b"I2C1");
        enter_i2c(&mut port).unwrap();

        let mut port = FakePort::replying(b"SPI1");
        assert!(matches!(
            enter_i2c(&mut port),
            Err(Error::UnexpectedModeId {
                expected: "I2C1",
                ..
            })
        ));
    }

    #[test]
    fn failed_command_reports_status() {
        let mut port = FakePort::replying(&[0x00]);
        assert!(matches!(
            start(&mut port),
            Err(Error::CommandFailed {
                command: 0x02,
                status: 0x00
            })
        ));
    }

    #[test]
    fn bulk_write_chunks_and_checks_acks() {
        let bytes: Vec<u8> = (0..18).collect();
        let mut replies = vec![SUCCESS];
        replies.extend([ACK; 16]);
        replies.push(SUCCESS);
        replies.extend([ACK; 2]);
        let mut port = FakePort::replying(&replies);

        bulk_write(&mut port, &bytes).unwrap();

        let mut expected: Vec<u8> = vec![0x1F];
        expected.extend(0..16);
        expected.push(0x11);
        expected.extend(16..18);
        assert_eq!(port.written, expected);
    }

    #[test]
    fn bulk_write_nack() {
        let mut port = FakePort::replying(&[SUCCESS, ACK, 0x01]);
        assert!(matches!(bulk_write(&mut port, &[1, 2]), Err(Error::Nack)));
    }

    #[test]
    fn write_then_read_frames_counts() {
        let mut port = FakePort::replying(&[SUCCESS, 0x12, 0x34]);
        let mut read = [0u8; 2];
        write_then_read(&mut port, &[0x80, 0x02], &mut read).unwrap();
        assert_eq!(read, [0x12, 0x34]);
        assert_eq!(port.written, [0x08, 0x00, 0x02, 0x00, 0x02, 0x80, 0x02]);
    }

    #[test]
    fn write_then_read_failure_is_nack() {
        let mut port = FakePort::replying(&[0x00]);
        assert!(matches!(
            write_then_read(&mut port, &[0x80], &mut []),
            Err(Error::Nack)
        ));
    }

    #[test]
    fn write_then_read_rejects_long_transfers() {
        let mut port = FakePort::default();
        let write = vec![0u8; 4097];
        assert!(matches!(
            write_then_read(&mut port, &write, &mut []),
            Err(Error::TransferTooLong(4097))
        ));
        assert!(port.written.is_empty());
    }

    #[test]
    fn speed_and_peripherals_pack_low_bits() {
        let mut port = FakePort::replying(&[SUCCESS, SUCCESS]);
        set_speed(&mut port, 3).unwrap();
        set_peripherals(&mut port, 0b1100).unwrap();
        assert_eq!(port.written, [0x63, 0x4C]);
    }
}
