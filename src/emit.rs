//! # Table Emitter
//!
//! Serializes an [`EphemerisTable`] into Rust source: a struct declaration
//! followed by one constant instance, ready to be dropped into the firmware's
//! ephemeris crate.
//!
//! ## Output Shapes
//!
//! ### Flat array
//! ```text
//! pub struct MoonEphemeris {
//!     // starting unix timestamp
//!     pub start: u64,
//!     // time between each entry in seconds
//!     pub period: u32,
//!     // moon angles in decidegrees
//!     pub angles: [u16; 3],
//! }
//!
//! pub const MOON_ANGLES: MoonEphemeris = MoonEphemeris {
//!     start: 1700000000,
//!     period: 3600,
//!     angles: [
//!         1234,
//!         1240,
//!         1246,
//!     ],
//! };
//! ```
//!
//! ### Dual array
//! Separate `shadow: &'static [i16]` (decidegrees) and
//! `elevation: &'static [i8]` (degrees) slices in a `MOON_EPHEMERIS`
//! constant.
//!
//! One literal per line, in sample order. The text is built completely in
//! memory; [`write_artifact`] then replaces the destination atomically so a
//! build never picks up a half-written table.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::table::{EphemerisTable, TableError};

/// Errors raised while emitting or parsing generated source.
#[derive(Error, Debug)]
pub enum EmitError {
    /// Dual-array output needs elevation samples
    #[error("dual-array output requires a table built with elevation")]
    MissingElevation,

    /// A shadow value does not fit the signed output type
    #[error("shadow sample {index} value {value} does not fit i16")]
    ShadowOverflow { index: usize, value: u16 },

    /// Writing into the text buffer failed
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),

    /// Generated text could not be parsed back
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Parsed values violate table invariants
    #[error("invalid table: {0}")]
    Table(#[from] TableError),
}

/// Shape of the generated declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One `angles: [u16; N]` array of shadow decidegrees
    FlatArray,
    /// `shadow: &[i16]` decidegrees plus `elevation: &[i8]` degrees
    DualArray,
}

/// Render `table` as Rust source in the requested shape.
pub fn emit(table: &EphemerisTable, format: OutputFormat) -> Result<String, EmitError> {
    match format {
        OutputFormat::FlatArray => emit_flat(table),
        OutputFormat::DualArray => emit_dual(table),
    }
}

fn emit_header(out: &mut String, table: &EphemerisTable) -> Result<(), EmitError> {
    writeln!(out, "    start: {},", table.start())?;
    writeln!(out, "    period: {},", table.period())?;
    Ok(())
}

fn emit_values<T: std::fmt::Display>(
    out: &mut String,
    values: impl Iterator<Item = T>,
) -> Result<(), EmitError> {
    for value in values {
        writeln!(out, "        {value},")?;
    }
    Ok(())
}

fn emit_flat(table: &EphemerisTable) -> Result<String, EmitError> {
    // ~8 bytes per line keeps large tables from reallocating
    let mut out = String::with_capacity(512 + table.count() * 8);

    writeln!(out, "pub struct MoonEphemeris {{")?;
    writeln!(out, "    // starting unix timestamp")?;
    writeln!(out, "    pub start: u64,")?;
    writeln!(out, "    // time between each entry in seconds")?;
    writeln!(out, "    pub period: u32,")?;
    writeln!(out, "    // moon angles in decidegrees")?;
    writeln!(out, "    pub angles: [u16; {}],", table.count())?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "pub const MOON_ANGLES: MoonEphemeris = MoonEphemeris {{")?;
    emit_header(&mut out, table)?;
    writeln!(out, "    angles: [")?;
    emit_values(&mut out, table.shadow().iter())?;
    writeln!(out, "    ],")?;
    writeln!(out, "}};")?;

    Ok(out)
}

fn emit_dual(table: &EphemerisTable) -> Result<String, EmitError> {
    let elevation = table.elevation().ok_or(EmitError::MissingElevation)?;
    let shadow = table
        .shadow()
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            i16::try_from(value).map_err(|_| EmitError::ShadowOverflow { index, value })
        })
        .collect::<Result<Vec<i16>, _>>()?;

    let mut out = String::with_capacity(512 + table.count() * 14);

    writeln!(out, "pub struct MoonEphemeris {{")?;
    writeln!(out, "    // starting unix timestamp")?;
    writeln!(out, "    pub start: u64,")?;
    writeln!(out, "    // time between each entry in seconds")?;
    writeln!(out, "    pub period: u32,")?;
    writeln!(out, "    // moon shadow angles in decidegrees")?;
    writeln!(out, "    pub shadow: &'static [i16],")?;
    writeln!(out, "    // moon elevation angle in degrees")?;
    writeln!(out, "    pub elevation: &'static [i8],")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "pub const MOON_EPHEMERIS: MoonEphemeris = MoonEphemeris {{")?;
    emit_header(&mut out, table)?;
    writeln!(out, "    shadow: &[")?;
    emit_values(&mut out, shadow.iter())?;
    writeln!(out, "    ],")?;
    writeln!(out, "    elevation: &[")?;
    emit_values(&mut out, elevation.iter())?;
    writeln!(out, "    ],")?;
    writeln!(out, "}};")?;

    Ok(out)
}

/// Which array the parser is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Angles,
    Shadow,
    Elevation,
}

/// Parse source produced by [`emit`] back into a table.
///
/// Only the literal instance is read; the struct declaration is skipped.
/// Both output shapes are recognized.
pub fn parse(text: &str) -> Result<EphemerisTable, EmitError> {
    let mut start: Option<u64> = None;
    let mut period: Option<u32> = None;
    let mut shadow: Vec<u16> = Vec::new();
    let mut elevation: Option<Vec<i8>> = None;
    let mut in_instance = false;
    let mut section = Section::Outside;

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        let err = |message: String| EmitError::Parse {
            line: line_no,
            message,
        };

        if !in_instance {
            in_instance = line.starts_with("pub const") || line.starts_with("const");
            continue;
        }

        match section {
            Section::Outside => {
                if let Some(v) = field_value(line, "start") {
                    start = Some(v.parse().map_err(|e| err(format!("bad start: {e}")))?);
                } else if let Some(v) = field_value(line, "period") {
                    period = Some(v.parse().map_err(|e| err(format!("bad period: {e}")))?);
                } else if line == "angles: [" {
                    section = Section::Angles;
                } else if line == "shadow: &[" {
                    section = Section::Shadow;
                } else if line == "elevation: &[" {
                    section = Section::Elevation;
                    elevation.get_or_insert_with(Vec::new);
                } else if line == "};" || line.is_empty() {
                    continue;
                } else {
                    return Err(err(format!("unexpected line `{line}`")));
                }
            }
            _ if line == "]," || line == "]" => section = Section::Outside,
            Section::Angles => {
                let v = line.trim_end_matches(',');
                shadow.push(v.parse().map_err(|e| err(format!("bad angle `{v}`: {e}")))?);
            }
            Section::Shadow => {
                let v = line.trim_end_matches(',');
                let value: i16 = v
                    .parse()
                    .map_err(|e| err(format!("bad shadow `{v}`: {e}")))?;
                let value =
                    u16::try_from(value).map_err(|_| err(format!("negative shadow `{v}`")))?;
                shadow.push(value);
            }
            Section::Elevation => {
                let v = line.trim_end_matches(',');
                let value: i8 = v
                    .parse()
                    .map_err(|e| err(format!("bad elevation `{v}`: {e}")))?;
                elevation.get_or_insert_with(Vec::new).push(value);
            }
        }
    }

    let last_line = text.lines().count();
    let missing = |field: &str| EmitError::Parse {
        line: last_line,
        message: format!("missing `{field}` field"),
    };
    let start = start.ok_or_else(|| missing("start"))?;
    let period = period.ok_or_else(|| missing("period"))?;

    Ok(EphemerisTable::new(start, period, shadow, elevation)?)
}

/// Value of a `name: value,` line
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name)?
        .strip_prefix(':')
        .map(|rest| rest.trim().trim_end_matches(','))
}

/// Write generated source to `path` atomically.
///
/// The text goes to a temporary file in the destination directory which is
/// then renamed over `path`.
pub fn write_artifact(path: &Path, text: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_table() -> EphemerisTable {
        EphemerisTable::new(
            1_700_000_000,
            3600,
            vec![0, 1, 1799, 1800, 3599],
            Some(vec![-90, -1, 0, 45, 90]),
        )
        .unwrap()
    }

    #[test]
    fn test_flat_output_layout() {
        let text = emit(&sample_table(), OutputFormat::FlatArray).unwrap();

        assert!(text.contains("pub angles: [u16; 5],"));
        assert!(text.contains("pub const MOON_ANGLES: MoonEphemeris = MoonEphemeris {"));
        assert!(text.contains("    start: 1700000000,\n    period: 3600,\n"));
        assert!(text.contains("    angles: [\n        0,\n        1,\n        1799,\n        1800,\n        3599,\n    ],\n"));
        assert!(text.ends_with("};\n"));
        assert!(!text.contains("elevation"));
    }

    #[test]
    fn test_dual_output_layout() {
        let text = emit(&sample_table(), OutputFormat::DualArray).unwrap();

        assert!(text.contains("pub shadow: &'static [i16],"));
        assert!(text.contains("pub elevation: &'static [i8],"));
        assert!(text.contains("pub const MOON_EPHEMERIS: MoonEphemeris = MoonEphemeris {"));
        assert!(text.contains("    elevation: &[\n        -90,\n        -1,\n        0,\n        45,\n        90,\n    ],\n"));

        // header fields come first, in fixed order
        let start = text.find("    start:").unwrap();
        let period = text.find("    period:").unwrap();
        let shadow = text.find("    shadow: &[").unwrap();
        assert!(start < period && period < shadow);
    }

    #[test]
    fn test_one_literal_per_sample() {
        let table = sample_table();
        let text = emit(&table, OutputFormat::DualArray).unwrap();
        let literal_lines = text
            .lines()
            .filter(|l| l.trim_end_matches(',').trim().parse::<i64>().is_ok())
            .count();
        assert_eq!(literal_lines, 2 * table.count());
    }

    #[test]
    fn test_dual_output_requires_elevation() {
        let table = EphemerisTable::new(0, 3600, vec![1, 2], None).unwrap();
        assert!(matches!(
            emit(&table, OutputFormat::DualArray),
            Err(EmitError::MissingElevation)
        ));
        // flat output does not need it
        assert!(emit(&table, OutputFormat::FlatArray).is_ok());
    }

    #[test]
    fn test_roundtrip_both_formats() {
        let table = sample_table();

        let dual = parse(&emit(&table, OutputFormat::DualArray).unwrap()).unwrap();
        assert_eq!(dual, table);

        let flat = parse(&emit(&table, OutputFormat::FlatArray).unwrap()).unwrap();
        assert_eq!(flat.start(), table.start());
        assert_eq!(flat.period(), table.period());
        assert_eq!(flat.shadow(), table.shadow());
        assert!(flat.elevation().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let text = "pub const X: MoonEphemeris = MoonEphemeris {\n    start: soon,\n};\n";
        assert!(matches!(parse(text), Err(EmitError::Parse { line: 2, .. })));

        let text = "pub const X: MoonEphemeris = MoonEphemeris {\n    period: 3600,\n    angles: [\n        1,\n    ],\n};\n";
        assert!(matches!(parse(text), Err(EmitError::Parse { .. })));
    }

    #[test]
    fn test_parse_enforces_table_invariants() {
        let text = "pub const X: MoonEphemeris = MoonEphemeris {\n    start: 5,\n    period: 3600,\n    angles: [\n        3600,\n    ],\n};\n";
        assert!(matches!(parse(text), Err(EmitError::Table(_))));
    }

    #[test]
    fn test_write_artifact_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.rs");

        std::fs::write(&path, "old contents").unwrap();
        write_artifact(&path, "new contents\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new contents\n");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_output_format_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: OutputFormat,
        }
        let w: Wrapper = toml::from_str("format = \"flat-array\"").unwrap();
        assert_eq!(w.format, OutputFormat::FlatArray);
        let w: Wrapper = toml::from_str("format = \"dual-array\"").unwrap();
        assert_eq!(w.format, OutputFormat::DualArray);
    }
}
