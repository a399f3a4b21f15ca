//! Run the calibration sweep once against an INA219 behind a Bus Pirate,
//! printing the sweep log to stdout, then halt.
use std::io::stdout;

use embedded_hal_mock::eh1::delay::StdSleep;
use ina219_sweep::{
    ina219, open, run_sweep, I2cSpeed, Ina219, LineReporter, Peripherals, SweepConfig,
};
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_millis().init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Provide the serial port path as the first argument.");
        std::process::exit(1)
    };

    let config = SweepConfig::default();

    let mut bp = open(&path)?.enter_i2c_mode(I2cSpeed::Khz400)?;
    // The INA219 breakout is powered from the Bus Pirate and needs its pull-ups.
    bp.configure_peripherals(Peripherals::builder().power(true).pullups(true).build())?;
    let mut sensor = Ina219::new(
        bp,
        StdSleep::new(),
        ina219::DEFAULT_ADDRESS,
        config.shunt_ohms,
    );

    let mut reporter = LineReporter::new(stdout().lock());
    let summary = run_sweep(&config, &mut sensor, &mut reporter)?;
    info!("{summary:?}");

    info!("Sweep finished, halting");
    loop {
        std::thread::park();
    }
}
