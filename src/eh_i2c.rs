use std::io::{Read, Write};

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use log::debug;

use crate::{modes, transfer, BusPirate, Error};

fn i2c_read_address(address: u8) -> u8 {
    (address << 1) | 1
}

fn i2c_write_address(address: u8) -> u8 {
    address << 1
}

/// Write address followed by the payload, as write-then-read expects.
fn with_address(address: u8, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() + 1);
    bytes.push(i2c_write_address(address));
    bytes.extend_from_slice(data);
    bytes
}

impl<P: Read + Write> ErrorType for BusPirate<modes::I2c, P> {
    type Error = Error;
}

impl<P: Read + Write> BusPirate<modes::I2c, P> {
    /// Everything between the first start and the final stop.
    fn transaction_body(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let is_read: Vec<bool> = operations
            .iter()
            .map(|op| matches!(op, Operation::Read(_)))
            .collect();

        // A (repeated) start is needed when:
        // - It is the first operation.
        // - The previous operation is of a different type to the current operation.
        let mut previous_was_read: Option<bool> = None;

        for (index, operation) in operations.iter_mut().enumerate() {
            let reading = is_read[index];
            if previous_was_read != Some(reading) {
                transfer::start(self.port())?;
                let address_byte = if reading {
                    i2c_read_address(address)
                } else {
                    i2c_write_address(address)
                };
                transfer::bulk_write(self.port(), &[address_byte])?;
            }
            previous_was_read = Some(reading);

            match operation {
                Operation::Write(bytes) => transfer::bulk_write(self.port(), bytes)?,
                Operation::Read(buffer) => {
                    // The last byte before a stop or a repeated start is NACKed.
                    let read_continues = is_read.get(index + 1).copied().unwrap_or(false);
                    let len = buffer.len();
                    for (i, slot) in buffer.iter_mut().enumerate() {
                        *slot = transfer::read_bus_byte(self.port())?;
                        if i + 1 == len && !read_continues {
                            transfer::nack(self.port())?;
                        } else {
                            transfer::ack(self.port())?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl<P: Read + Write> I2c for BusPirate<modes::I2c, P> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        debug!("I2C transaction {address:#04x} ops:{}", operations.len());

        let result = self.transaction_body(address, operations);
        // Release the bus even if the body failed; the first error wins.
        let stop = transfer::stop(self.port());
        result.and(stop)
    }

    fn write(&mut self, address: SevenBitAddress, write: &[u8]) -> Result<(), Self::Error> {
        debug!("I2C Write {address:#04x} w:{}", write.len());
        transfer::write_then_read(self.port(), &with_address(address, write), &mut [])
    }

    fn write_read(
        &mut self,
        address: SevenBitAddress,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        debug!(
            "I2C Write-read {address:#04x} w:{} r:{}",
            write.len(),
            read.len()
        );
        transfer::write_then_read(self.port(), &with_address(address, write), read)
    }

    fn read(&mut self, address: SevenBitAddress, read: &mut [u8]) -> Result<(), Self::Error> {
        debug!("I2C Read {address:#04x} r:{}", read.len());
        self.transaction(address, &mut [Operation::Read(read)])
    }
}
