//! # Moon Ephemeris Core Library
//!
//! This library precomputes the moon's shadow angle (and optionally its
//! elevation above a fixed observer) every hour over a multi-year window and
//! serializes the result as a Rust constant. The firmware embeds that constant
//! and only has to interpolate between two entries at runtime; it never needs
//! an ephemeris of its own.
//!
//! ## Design Philosophy
//!
//! ### Compact Encoding
//! - **Shadow angle**: `u16` decidegrees in [0, 3599], 0.1° resolution
//! - **Elevation**: `i8` whole degrees in [-90, 90]
//! - **Time**: implicit. Sample `i` is `start + i * period`, so a ten year
//!   hourly table costs 87 600 × 3 bytes and no timestamps
//!
//! ### Fail Loudly
//! Generation is an offline build step. A provider failure, collapsed
//! geometry or out-of-range value aborts the run; a partial or wrapped table
//! is never emitted.
//!
//! ### Data Flow
//! 1. **Sample**: [`sampler`] walks the schedule and queries a
//!    [`PositionProvider`] for sun, earth and moon
//! 2. **Derive**: [`geometry`] turns three positions into a signed shadow angle
//! 3. **Quantize**: [`table`] stores the validated integer samples
//! 4. **Emit**: [`emit`] writes the Rust declaration atomically
//!
//! [`lookup`] reads a table back the way the firmware does, and [`renderer`]
//! draws phases into a PNG for eyeballing a run.
//!
//! # Example
//! ```
//! use moon_ephemeris_lib::{
//!     build_table, emit, GeodeticLocation, LowPrecisionEphemeris, OutputFormat, Schedule,
//! };
//!
//! let schedule = Schedule { start: 1_700_000_000, period: 3600, count: 24, with_elevation: true };
//! let paris = GeodeticLocation { longitude_deg: 2.3522, latitude_deg: 48.8566, height_m: 35.0 };
//!
//! let table = build_table(&LowPrecisionEphemeris::default(), &schedule, &paris).unwrap();
//! assert_eq!(table.count(), 24);
//!
//! let source = emit(&table, OutputFormat::DualArray).unwrap();
//! assert!(source.contains("pub const MOON_EPHEMERIS"));
//! ```

pub mod canvas;
pub mod config;
pub mod emit;
pub mod ephemeris;
pub mod geometry;
pub mod lookup;
pub mod provider;
pub mod renderer;
pub mod sampler;
pub mod table;

pub use emit::{emit, parse, write_artifact, EmitError, OutputFormat};
pub use ephemeris::LowPrecisionEphemeris;
pub use geometry::{compute_elevation, compute_shadow_angle, normalize_0_2pi};
pub use provider::{Body, GeodeticLocation, HorizonPosition, PositionProvider, ProviderError};
#[cfg(feature = "parallel")]
pub use sampler::build_table_parallel;
pub use sampler::{build_table, Schedule};
pub use table::{EphemerisTable, TableError};
