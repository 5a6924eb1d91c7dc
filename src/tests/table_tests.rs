//! # End-to-End Table Tests
//!
//! Runs the real low-precision ephemeris through sampling, emission, parsing
//! and lookup, the way a generation run does.

use moon_ephemeris_lib::{
    build_table, config::Config, emit, lookup, parse, EphemerisTable, GeodeticLocation,
    LowPrecisionEphemeris, OutputFormat, Schedule,
};
use tempfile::TempDir;

use crate::{cmd_generate, sample};

const PARIS: GeodeticLocation = GeodeticLocation {
    longitude_deg: 2.3522,
    latitude_deg: 48.8566,
    height_m: 35.0,
};

fn one_day() -> Schedule {
    Schedule {
        start: 1_700_000_000,
        period: 3600,
        count: 24,
        with_elevation: true,
    }
}

fn one_day_table() -> EphemerisTable {
    build_table(&LowPrecisionEphemeris::default(), &one_day(), &PARIS).unwrap()
}

/// A day of hourly samples has aligned arrays with every value in range.
#[test]
fn day_of_samples_is_in_range() {
    let table = one_day_table();

    assert_eq!(table.start(), 1_700_000_000);
    assert_eq!(table.period(), 3600);
    assert_eq!(table.count(), 24);
    assert!(table.shadow().iter().all(|&s| s <= 3599));

    let elevation = table.elevation().unwrap();
    assert_eq!(elevation.len(), 24);
    assert!(elevation.iter().all(|e| (-90..=90).contains(e)));
}

/// The moon moves about 0.5° per hour against the sun, so neighbouring
/// samples differ by a few decidegrees along the shortest arc.
#[test]
fn shadow_angle_advances_smoothly() {
    let table = one_day_table();

    for pair in table.shadow().windows(2) {
        let step = (i32::from(pair[1]) - i32::from(pair[0])).rem_euclid(3600);
        let step = if step > 1800 { step - 3600 } else { step };
        assert!(
            step.abs() <= 10,
            "step {} between {} and {}",
            step,
            pair[0],
            pair[1]
        );
    }
}

/// Emitted source parses back to the same table.
#[test]
fn emitted_table_parses_back() {
    let table = one_day_table();
    let source = emit(&table, OutputFormat::DualArray).unwrap();
    assert_eq!(parse(&source).unwrap(), table);
}

/// Lookup reproduces stored samples and stays in range between them.
#[test]
fn lookup_reads_generated_table() {
    let table = one_day_table();
    let start = table.start() as i64;

    for (i, &s) in table.shadow().iter().enumerate() {
        let t = start + i as i64 * 3600;
        assert_eq!(lookup::shadow_angle_at(&table, t), Some(u32::from(s) * 10));
    }
    for t in (start..start + 23 * 3600).step_by(1234) {
        let angle = lookup::shadow_angle_at(&table, t).unwrap();
        assert!(angle < 36000);
        let elevation = lookup::elevation_at(&table, t).unwrap();
        assert!((-900..=900).contains(&elevation));
    }
    assert_eq!(lookup::shadow_angle_at(&table, start + 24 * 3600), None);
}

/// Parallel and sequential builds emit byte-identical source.
#[test]
fn parallel_output_matches_sequential() {
    let schedule = Schedule {
        count: 48,
        ..one_day()
    };

    let sequential = sample(&schedule, &PARIS, false).unwrap();
    let parallel = sample(&schedule, &PARIS, true).unwrap();

    for format in [OutputFormat::FlatArray, OutputFormat::DualArray] {
        assert_eq!(
            emit(&sequential, format).unwrap(),
            emit(&parallel, format).unwrap()
        );
    }
}

/// Instants outside the ephemeris window fail the whole run.
#[test]
fn out_of_range_schedule_fails() {
    let schedule = Schedule {
        // 2099-12-31T12:00:00Z, runs past the end of 2099
        start: 4_102_401_600,
        ..one_day()
    };
    assert!(sample(&schedule, &PARIS, false).is_err());
}

/// The generate command writes a parseable declaration to the configured file.
#[test]
fn generate_command_writes_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.rs");

    let mut config = Config::default();
    config.generator.count = 6;
    config.generator.format = OutputFormat::FlatArray;
    config.generator.output = Some(path.clone());

    cmd_generate(&config, None, None, true).unwrap();

    let source = std::fs::read_to_string(&path).unwrap();
    assert!(source.contains("pub angles: [u16; 6],"));
    let table = parse(&source).unwrap();
    assert_eq!(table.count(), 6);
    assert!(table.elevation().is_none());
}

/// Command line overrides win over the configuration.
#[test]
fn generate_command_overrides() {
    let dir = TempDir::new().unwrap();
    let configured = dir.path().join("configured.rs");
    let requested = dir.path().join("requested.rs");

    let mut config = Config::default();
    config.generator.output = Some(configured.clone());

    cmd_generate(&config, Some(requested.clone()), Some(3), false).unwrap();

    assert!(!configured.exists());
    let table = parse(&std::fs::read_to_string(&requested).unwrap()).unwrap();
    assert_eq!(table.count(), 3);
    assert_eq!(table.elevation().map(<[i8]>::len), Some(3));
}
