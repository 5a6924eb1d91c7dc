//! # Position Provider Interface
//!
//! The table builder never computes orbits itself. It asks a
//! [`PositionProvider`] for body positions at a given instant and treats the
//! answers as an oracle. Any type implementing the trait can drive a build,
//! which is how tests inject recording or failing providers.

use chrono::{DateTime, Utc};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bodies the generator needs positions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Earth,
    Moon,
}

impl std::fmt::Display for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Body::Sun => "sun",
            Body::Earth => "earth",
            Body::Moon => "moon",
        };
        f.write_str(name)
    }
}

/// Errors a position provider may report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The requested instant is outside the window the ephemeris covers
    #[error("ephemeris unavailable at {instant}: supported range is {from} .. {until}")]
    OutOfRange {
        instant: DateTime<Utc>,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    },

    /// The provider cannot answer this query for the given body
    #[error("no {query} available for {body}")]
    UnsupportedBody { body: Body, query: &'static str },

    /// The provider computed an unusable value (e.g. the body sits on the observer)
    #[error("invalid {body} position at {instant}")]
    InvalidPosition {
        body: Body,
        instant: DateTime<Utc>,
    },
}

/// Position of a body in the local horizon frame of an observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonPosition {
    /// Angular height above the horizon, -90 to +90 degrees
    pub altitude_deg: f64,
    /// Azimuth measured from north through east, 0 to 360 degrees
    pub azimuth_deg: f64,
}

/// A fixed observer on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticLocation {
    /// Longitude in degrees, east positive
    pub longitude_deg: f64,
    /// Geodetic latitude in degrees, north positive
    pub latitude_deg: f64,
    /// Height above the ellipsoid in meters
    pub height_m: f64,
}

/// Source of body positions.
///
/// `position_at` returns positions of all bodies in one common inertial frame
/// so they can be subtracted from each other. `horizon_position_at` returns
/// the apparent altitude/azimuth of a body for a ground observer, without
/// atmospheric refraction.
pub trait PositionProvider {
    fn position_at(&self, instant: DateTime<Utc>, body: Body) -> Result<DVec3, ProviderError>;

    fn horizon_position_at(
        &self,
        instant: DateTime<Utc>,
        body: Body,
        location: &GeodeticLocation,
    ) -> Result<HorizonPosition, ProviderError>;
}
