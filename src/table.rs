//! # Ephemeris Table
//!
//! The immutable, fully validated result of a generation run. Construction is
//! the only place invariants are checked; once a table exists every sample is
//! guaranteed to be in its encoded range and the arrays are aligned.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::geometry::GeometryError;
use crate::provider::ProviderError;

/// Largest stored shadow value (359.9°)
pub const MAX_SHADOW_DECIDEGREES: u16 = 3599;

/// Elevation bounds in whole degrees
pub const MIN_ELEVATION_DEGREES: i8 = -90;
pub const MAX_ELEVATION_DEGREES: i8 = 90;

/// Errors raised while building or assembling a table.
///
/// Every variant is fatal for the run: a table is either complete and
/// consistent, or it does not exist.
#[derive(Error, Debug)]
pub enum TableError {
    /// The position provider could not answer for one sample
    #[error("sample {index} at {instant}: {source}")]
    Provider {
        index: usize,
        instant: DateTime<Utc>,
        #[source]
        source: ProviderError,
    },

    /// Body positions collapsed for one sample
    #[error("sample {index} at {instant}: {source}")]
    Geometry {
        index: usize,
        instant: DateTime<Utc>,
        #[source]
        source: GeometryError,
    },

    /// A value does not fit its encoded range
    #[error("sample {index}: {quantity} value {value} is outside its encoded range")]
    Quantization {
        index: usize,
        quantity: Quantity,
        value: f64,
    },

    /// `start + index * period` does not map to a representable instant
    #[error("sample {index}: timestamp overflows")]
    InstantOverflow { index: usize },

    /// Schedule or table layout is unusable
    #[error("invalid table layout: {0}")]
    Layout(String),
}

/// The two encoded quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Shadow,
    Elevation,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Shadow => f.write_str("shadow"),
            Quantity::Elevation => f.write_str("elevation"),
        }
    }
}

/// Hourly moon table ready to be emitted.
///
/// Sample `i` was computed for `start + i * period`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemerisTable {
    start: u64,
    period: u32,
    shadow: Vec<u16>,
    elevation: Option<Vec<i8>>,
}

impl EphemerisTable {
    /// Assemble a table, checking every invariant.
    ///
    /// # Example
    /// ```
    /// use moon_ephemeris_lib::EphemerisTable;
    ///
    /// let table = EphemerisTable::new(1_700_000_000, 3600, vec![0, 900, 1800], Some(vec![-5, 0, 12]))
    ///     .unwrap();
    /// assert_eq!(table.count(), 3);
    /// assert_eq!(table.instant_of(2), Some(1_700_007_200));
    ///
    /// // misaligned arrays are rejected
    /// assert!(EphemerisTable::new(0, 3600, vec![0, 1], Some(vec![0])).is_err());
    /// ```
    pub fn new(
        start: u64,
        period: u32,
        shadow: Vec<u16>,
        elevation: Option<Vec<i8>>,
    ) -> Result<Self, TableError> {
        if period == 0 {
            return Err(TableError::Layout("period must be positive".into()));
        }
        if shadow.is_empty() {
            return Err(TableError::Layout("table must hold at least one sample".into()));
        }

        if let Some((index, &value)) = shadow
            .iter()
            .enumerate()
            .find(|&(_, &v)| v > MAX_SHADOW_DECIDEGREES)
        {
            return Err(TableError::Quantization {
                index,
                quantity: Quantity::Shadow,
                value: f64::from(value),
            });
        }

        if let Some(elevation) = &elevation {
            if elevation.len() != shadow.len() {
                return Err(TableError::Layout(format!(
                    "{} shadow samples but {} elevation samples",
                    shadow.len(),
                    elevation.len()
                )));
            }
            if let Some((index, &value)) = elevation
                .iter()
                .enumerate()
                .find(|(_, v)| !(MIN_ELEVATION_DEGREES..=MAX_ELEVATION_DEGREES).contains(*v))
            {
                return Err(TableError::Quantization {
                    index,
                    quantity: Quantity::Elevation,
                    value: f64::from(value),
                });
            }
        }

        Ok(Self {
            start,
            period,
            shadow,
            elevation,
        })
    }

    /// Unix timestamp of the first sample
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Seconds between consecutive samples
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Number of samples
    pub fn count(&self) -> usize {
        self.shadow.len()
    }

    /// Shadow angles in decidegrees, [0, 3599]
    pub fn shadow(&self) -> &[u16] {
        &self.shadow
    }

    /// Moon elevations in whole degrees, when the table was built with them
    pub fn elevation(&self) -> Option<&[i8]> {
        self.elevation.as_deref()
    }

    /// Unix timestamp of sample `index`, if the table holds it
    pub fn instant_of(&self, index: usize) -> Option<u64> {
        if index >= self.count() {
            return None;
        }
        u64::try_from(index)
            .ok()?
            .checked_mul(u64::from(self.period))?
            .checked_add(self.start)
    }
}

/// Quantize a normalized shadow angle (radians) to decidegrees.
///
/// Uses `round(10 * degrees)`. An angle a hair below 2π rounds to 3600,
/// which is the same direction as 0 and is stored as 0. Anything else outside
/// [0, 3599] (including NaN) is an error, never a silent wrap.
pub fn quantize_shadow(index: usize, alpha: f64) -> Result<u16, TableError> {
    let decidegrees = (10.0 * alpha.to_degrees()).round();
    let overflow = TableError::Quantization {
        index,
        quantity: Quantity::Shadow,
        value: decidegrees,
    };

    if !decidegrees.is_finite() || !(0.0..=3600.0).contains(&decidegrees) {
        return Err(overflow);
    }
    if decidegrees == 3600.0 {
        return Ok(0);
    }
    Ok(decidegrees as u16)
}

/// Quantize an elevation in degrees to whole degrees by truncation.
pub fn quantize_elevation(index: usize, elevation_deg: f64) -> Result<i8, TableError> {
    let degrees = elevation_deg.trunc();
    let range = f64::from(MIN_ELEVATION_DEGREES)..=f64::from(MAX_ELEVATION_DEGREES);

    if !degrees.is_finite() || !range.contains(&degrees) {
        return Err(TableError::Quantization {
            index,
            quantity: Quantity::Elevation,
            value: elevation_deg,
        });
    }
    Ok(degrees as i8)
}
