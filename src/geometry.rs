//! # Shadow Angle and Elevation Geometry
//!
//! Pure functions turning instantaneous body positions into the two
//! quantities stored in the ephemeris table.
//!
//! ## Shadow Angle
//!
//! The phase is expressed through two directions seen from the moon:
//! - **v1**: sun → moon (the direction sunlight travels when it hits the moon)
//! - **v2**: moon → earth (the direction the lit face is observed from)
//!
//! `acos(v1·v2)` gives the unsigned angle in [0, π]. The sign is recovered by
//! checking the handedness of `v1 × v2` against a fixed "up" axis, then the
//! result is flipped once more so that the reference edge is the right side of
//! the moon's shadow. The final value is folded into [0, 2π).
//!
//! Working only with three positions keeps the formula frame-independent: no
//! orbital elements or ecliptic longitudes are needed.

use core::f64::consts::TAU;
use glam::DVec3;
use thiserror::Error;

use crate::provider::HorizonPosition;

/// Reference "up" axis of the working frame (celestial north in an
/// equatorial frame).
pub const UP: DVec3 = DVec3::Z;

/// Geometry failures. Only degenerate input can fail.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A direction vector collapsed to zero length or is not finite
    #[error("degenerate geometry: {0} direction has zero length or is not finite")]
    Degenerate(Direction),
}

/// The two directions the shadow angle is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    SunToMoon,
    MoonToEarth,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::SunToMoon => write!(f, "sun->moon"),
            Direction::MoonToEarth => write!(f, "moon->earth"),
        }
    }
}

/// Fold any finite angle into [0, 2π).
///
/// Equivalent to `((x mod 2π) + 2π) mod 2π`. Rounding can make
/// `rem_euclid` return exactly 2π for tiny negative inputs; that value is
/// folded back to 0, and negative zero is scrubbed, so the result is
/// always inside the half-open interval.
pub fn normalize_0_2pi(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU) + 0.0;
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Compute the signed moon shadow angle in radians, normalized to [0, 2π).
///
/// All three positions must be expressed in the same frame at the same
/// instant. Coincident bodies are a precondition violation and are reported
/// as [`GeometryError::Degenerate`] instead of producing NaN.
///
/// # Example
/// ```
/// use glam::DVec3;
/// use moon_ephemeris_lib::geometry::compute_shadow_angle;
///
/// // earth between sun and moon: fully lit disk seen from earth
/// let sun = DVec3::new(0.0, 0.0, 0.0);
/// let earth = DVec3::new(1.0, 0.0, 0.0);
/// let moon = DVec3::new(2.0, 0.0, 0.0);
///
/// let alpha = compute_shadow_angle(sun, earth, moon).unwrap();
/// assert!((alpha - std::f64::consts::PI).abs() < 1e-9);
/// ```
pub fn compute_shadow_angle(sun: DVec3, earth: DVec3, moon: DVec3) -> Result<f64, GeometryError> {
    let v1n = (moon - sun)
        .try_normalize()
        .ok_or(GeometryError::Degenerate(Direction::SunToMoon))?;
    let v2n = (earth - moon)
        .try_normalize()
        .ok_or(GeometryError::Degenerate(Direction::MoonToEarth))?;

    // unit vectors may drift a hair outside [-1, 1]
    let mut alpha = v1n.dot(v2n).clamp(-1.0, 1.0).acos();

    // arccos loses the sign; recover it from the rotation handedness
    let cp = v1n.cross(v2n);
    if UP.dot(cp) < 0.0 {
        alpha = -alpha;
    }

    // reference is the right side of moon shadow
    alpha = -alpha;

    Ok(normalize_0_2pi(alpha))
}

/// Moon elevation in degrees from its horizon-frame position.
///
/// The horizon transform itself belongs to the position provider; the value
/// is returned untouched and truncated to whole degrees only when quantized.
pub fn compute_elevation(horizon: &HorizonPosition) -> f64 {
    horizon.altitude_deg
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, PI};
    use proptest::prelude::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn test_normalize_known_values() {
        assert_eq!(normalize_0_2pi(0.0), 0.0);
        assert!((normalize_0_2pi(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert!((normalize_0_2pi(TAU + 1.0) - 1.0).abs() < 1e-12);
        assert!((normalize_0_2pi(-3.0 * TAU - 1.0) - (TAU - 1.0)).abs() < 1e-9);
        assert_eq!(normalize_0_2pi(TAU), 0.0);
    }

    #[test]
    fn test_normalize_never_returns_negative_zero_or_tau() {
        let z = normalize_0_2pi(-0.0);
        assert!(z.is_sign_positive(), "negative zero leaked: {z:?}");

        let tiny = normalize_0_2pi(-1e-18);
        assert!((0.0..TAU).contains(&tiny), "got {tiny}");
    }

    #[test]
    fn test_moon_between_sun_and_earth_is_zero() {
        let sun = DVec3::new(0.0, 0.0, 0.0);
        let moon = DVec3::new(1.0, 0.0, 0.0);
        let earth = DVec3::new(2.0, 0.0, 0.0);

        let alpha = compute_shadow_angle(sun, earth, moon).unwrap();
        assert!(alpha.abs() < TOL, "expected 0, got {alpha}");
        assert!(alpha.is_sign_positive());
    }

    #[test]
    fn test_earth_between_sun_and_moon_is_pi() {
        let sun = DVec3::new(0.0, 0.0, 0.0);
        let earth = DVec3::new(1.0, 0.0, 0.0);
        let moon = DVec3::new(2.0, 0.0, 0.0);

        let alpha = compute_shadow_angle(sun, earth, moon).unwrap();
        assert!((alpha - PI).abs() < TOL, "expected π, got {alpha}");
    }

    #[test]
    fn test_quadrature_sign_convention() {
        let sun = DVec3::ZERO;
        let moon = DVec3::new(1.0, 0.0, 0.0);

        // v1 × v2 points along +z: first sign check keeps it, reference flip negates it
        let earth_left = moon + DVec3::Y;
        let alpha = compute_shadow_angle(sun, earth_left, moon).unwrap();
        assert!((alpha - 3.0 * FRAC_PI_2).abs() < TOL, "got {alpha}");

        // v1 × v2 points along -z: the two flips cancel out
        let earth_right = moon - DVec3::Y;
        let alpha = compute_shadow_angle(sun, earth_right, moon).unwrap();
        assert!((alpha - FRAC_PI_2).abs() < TOL, "got {alpha}");
    }

    #[test]
    fn test_result_does_not_depend_on_vector_scale() {
        let sun = DVec3::new(-3.0, 1.0, 0.2);
        let earth = DVec3::new(5.0, 2.0, -0.4);
        let moon = DVec3::new(5.1, 2.3, -0.35);

        let a = compute_shadow_angle(sun, earth, moon).unwrap();
        let b = compute_shadow_angle(sun * 1e6, earth * 1e6, moon * 1e6).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_bodies_are_rejected() {
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(
            compute_shadow_angle(p, DVec3::ZERO, p),
            Err(GeometryError::Degenerate(Direction::SunToMoon))
        );
        assert_eq!(
            compute_shadow_angle(DVec3::ZERO, p, p),
            Err(GeometryError::Degenerate(Direction::MoonToEarth))
        );
    }

    #[test]
    fn test_non_finite_positions_are_rejected() {
        let nan = DVec3::new(f64::NAN, 0.0, 0.0);
        assert!(compute_shadow_angle(DVec3::ZERO, DVec3::X, nan).is_err());
    }

    #[test]
    fn test_elevation_passes_altitude_through() {
        let horizon = HorizonPosition {
            altitude_deg: -12.75,
            azimuth_deg: 200.0,
        };
        assert_eq!(compute_elevation(&horizon), -12.75);
    }

    fn coord() -> impl Strategy<Value = f64> {
        -1e3f64..1e3
    }

    fn vector() -> impl Strategy<Value = DVec3> {
        (coord(), coord(), coord()).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    proptest! {
        #[test]
        fn prop_shadow_angle_in_range(sun in vector(), earth in vector(), moon in vector()) {
            prop_assume!((moon - sun).length() > 1e-6);
            prop_assume!((earth - moon).length() > 1e-6);

            let alpha = compute_shadow_angle(sun, earth, moon).unwrap();
            prop_assert!((0.0..TAU).contains(&alpha), "alpha = {}", alpha);
        }

        #[test]
        fn prop_normalize_is_idempotent(x in -1e9f64..1e9) {
            let once = normalize_0_2pi(x);
            prop_assert_eq!(normalize_0_2pi(once), once);
            prop_assert!((0.0..TAU).contains(&once));
        }
    }
}
