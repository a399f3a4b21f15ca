//! One sweep section against a mocked INA219, rendered to text and parsed back.
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
use ina219_sweep::{
    ina219::DEFAULT_ADDRESS as ADDR, log_parse, run_sweep, Ina219, LineReporter, Record,
    SweepConfig,
};

const CALIBRATIONS: [u16; 8] = [65472, 32736, 21824, 16368, 13094, 10912, 9353, 8184];

fn trial(calibration: u16) -> Vec<Transaction> {
    let [cal_msb, cal_lsb] = calibration.to_be_bytes();
    let mut transactions = vec![
        Transaction::write(ADDR, vec![0x00, 0x80, 0x00]),
        Transaction::write(ADDR, vec![0x05, cal_msb, cal_lsb]),
        Transaction::write(ADDR, vec![0x00, 0x39, 0x9F]),
    ];
    for _ in 0..3 {
        transactions.extend([
            // 5000 mV
            Transaction::write_read(ADDR, vec![0x02], (1250u16 << 3).to_be_bytes().to_vec()),
            Transaction::write_read(ADDR, vec![0x04], 2000u16.to_be_bytes().to_vec()),
            // 12.34 mV
            Transaction::write_read(ADDR, vec![0x01], 1234u16.to_be_bytes().to_vec()),
        ]);
    }
    transactions
}

#[test]
fn single_section_round_trip() {
    let expected: Vec<Transaction> = CALIBRATIONS.iter().flat_map(|&c| trial(c)).collect();
    let i2c = Mock::new(&expected);
    let mut sensor = Ina219::new(i2c, NoopDelay, ADDR, 0.1);

    let config = SweepConfig::builder()
        .min_current_ma(205)
        .max_current_ma(205)
        .build();
    let mut reporter = LineReporter::new(Vec::new());
    let summary = run_sweep(&config, &mut sensor, &mut reporter).unwrap();
    assert_eq!(summary.trials, 8);
    assert_eq!(summary.samples, 24);

    let (mut i2c, _) = sensor.release();
    i2c.done();

    let log = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(log.starts_with("=== Imax=205 mA (0.205 A) ===\n"));
    assert!(log.ends_with("--- END Imax=205 mA (0.205 A) ---\n\n"));

    let records: Vec<Record> = log
        .lines()
        .filter_map(|line| log_parse::parse_line(line).unwrap())
        .collect();
    assert_eq!(records.len(), 26);

    let (data, errors) = log_parse::data_records(&log);
    assert!(errors.is_empty());
    assert_eq!(data.len(), 24);

    let calibrations: Vec<u16> = data.iter().step_by(3).map(|d| d.calibration).collect();
    assert_eq!(calibrations, CALIBRATIONS);

    for d in &data {
        assert_eq!(d.max_current_ma, 205);
        assert_eq!(d.reading.bus_voltage_mv, 5000);
        assert_eq!(d.reading.shunt_voltage_mv, 12);
    }
    assert_eq!(data[0].reading.current_ma, 13);
    assert_eq!(data[23].reading.current_ma, 100);
    assert_eq!(data[23].sample_index, 3);
    assert_eq!(data[23].scale, 8);
}
