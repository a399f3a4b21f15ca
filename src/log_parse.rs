//! Read sweep logs back into [`Record`]s for offline analysis.
//!
//! Accepts what [`LineReporter`](crate::LineReporter) writes, also when a
//! terminal capture put a prefix such as a timestamp in front of the tag.
//! Lines without a record tag are ignored.

use std::str::FromStr;

use crate::error::ParseError;
use crate::report::{DataRecord, Record, SampleReading};

const DATA_TAG: &str = "DATA: ";
const SKIP_TAG: &str = "SKIP: ";
const FOOTER_TAG: &str = "--- END ";
const HEADER_TAG: &str = "=== ";

/// Parse one log line. `Ok(None)` for lines that carry no record.
pub fn parse_line(line: &str) -> Result<Option<Record>, ParseError> {
    let line = line.trim_end();
    let Some((tag, start)) = [DATA_TAG, SKIP_TAG, FOOTER_TAG, HEADER_TAG]
        .into_iter()
        .find_map(|tag| line.find(tag).map(|start| (tag, start)))
    else {
        return Ok(None);
    };
    let mut parser = Parser {
        line,
        rest: &line[start + tag.len()..],
    };

    let record = match tag {
        DATA_TAG => Record::Data(parser.data()?),
        SKIP_TAG => parser.skip()?,
        FOOTER_TAG => {
            let (max_current_ma, max_current_a) = parser.imax()?;
            parser.expect(" ---", "footer")?;
            Record::SectionFooter {
                max_current_ma,
                max_current_a,
            }
        }
        _ => {
            let (max_current_ma, max_current_a) = parser.imax()?;
            parser.expect(" ===", "header")?;
            Record::SectionHeader {
                max_current_ma,
                max_current_a,
            }
        }
    };

    if parser.rest.is_empty() {
        Ok(Some(record))
    } else {
        Err(parser.error("trailing text"))
    }
}

/// Every DATA record in `log`, in order. Malformed tagged lines are returned
/// separately so the caller can decide how loud to be about them.
pub fn data_records(log: &str) -> (Vec<DataRecord>, Vec<ParseError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for line in log.lines() {
        match parse_line(line) {
            Ok(Some(Record::Data(data))) => records.push(data),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }
    (records, errors)
}

struct Parser<'a> {
    line: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, field: &'static str) -> ParseError {
        ParseError {
            line: self.line.to_owned(),
            field,
        }
    }

    fn eat(&mut self, literal: &str) -> bool {
        match self.rest.strip_prefix(literal) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, literal: &str, field: &'static str) -> Result<(), ParseError> {
        if self.eat(literal) {
            Ok(())
        } else {
            Err(self.error(field))
        }
    }

    /// A number running up to the next occurrence of `terminator`.
    fn number<T: FromStr>(&mut self, terminator: &str, field: &'static str) -> Result<T, ParseError> {
        let (text, rest) = self
            .rest
            .split_once(terminator)
            .ok_or_else(|| self.error(field))?;
        let value = text.parse().map_err(|_| self.error(field))?;
        self.rest = rest;
        Ok(value)
    }

    /// `Imax=205 mA (0.205 A)`
    fn imax(&mut self) -> Result<(u32, f64), ParseError> {
        self.expect("Imax=", "Imax")?;
        let ma = self.number(" mA (", "Imax mA")?;
        let a = self.number(" A)", "Imax A")?;
        Ok((ma, a))
    }

    /// `Imax=200 mA ×1 LSB → Calibration value overflow: 67108`
    fn skip(&mut self) -> Result<Record, ParseError> {
        self.expect("Imax=", "Imax")?;
        let max_current_ma = self.number(" mA ×", "Imax mA")?;
        let scale = self.number(" LSB → Calibration value overflow: ", "scale")?;
        let calibration_raw = self.rest.parse().map_err(|_| self.error("calibration"))?;
        self.rest = "";
        Ok(Record::Skip {
            max_current_ma,
            scale,
            calibration_raw,
        })
    }

    fn data(&mut self) -> Result<DataRecord, ParseError> {
        self.expect("READ", "READ")?;
        let sample_index = self.number(", ", "READ")?;
        let (max_current_ma, max_current_a) = self.imax()?;
        self.expect(", LSB=", "LSB")?;
        let scaled_lsb_a = self.number(" A, Scale=", "LSB")?;
        let scale = self.number(", CAL=", "Scale")?;
        let calibration = self.number(" (0x", "CAL")?;
        let (hex, rest) = self
            .rest
            .split_once(')')
            .ok_or_else(|| self.error("CAL hex"))?;
        if u16::from_str_radix(hex, 16) != Ok(calibration) {
            return Err(self.error("CAL hex"));
        }
        self.rest = rest;
        self.expect(", Bus=", "Bus")?;
        let bus_voltage_mv = self.number(" mV, Current=", "Bus")?;
        let current_ma = self.number(" mA, Shunt=", "Current")?;
        let shunt_voltage_mv = self.number(" mV", "Shunt")?;
        Ok(DataRecord {
            sample_index,
            max_current_ma,
            max_current_a,
            scaled_lsb_a,
            scale,
            calibration,
            reading: SampleReading {
                bus_voltage_mv,
                current_ma,
                shunt_voltage_mv,
            },
        })
    }
}
