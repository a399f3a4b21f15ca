//! Convert a sweep log into a CSV table of its DATA records.
use std::io::{stdout, Write};

use ina219_sweep::log_parse;
use log::{info, warn};

const HEADER: &str =
    "Imax_mA,Imax_A,READ,LSB_A,Scale,Calibration,Bus_Voltage_mV,Current_mA,Shunt_Voltage_mV";

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_millis().init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Provide the sweep log path as the first argument.");
        std::process::exit(1)
    };

    let log = std::fs::read_to_string(&path)?;
    let (records, errors) = log_parse::data_records(&log);
    for error in &errors {
        warn!("Skipping {error}");
    }

    let mut out = stdout().lock();
    writeln!(out, "{HEADER}")?;
    for r in &records {
        writeln!(
            out,
            "{},{},{},{:e},{},{},{},{},{}",
            r.max_current_ma,
            r.max_current_a,
            r.sample_index,
            r.scaled_lsb_a,
            r.scale,
            r.calibration,
            r.reading.bus_voltage_mv,
            r.reading.current_ma,
            r.reading.shunt_voltage_mv,
        )?;
    }
    out.flush()?;

    info!("{} records, {} malformed lines", records.len(), errors.len());
    Ok(())
}
