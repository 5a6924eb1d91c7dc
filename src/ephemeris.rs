//! Low-precision analytic sun & moon ephemeris (Meeus, truncated ELP-2000/82)
//!
//! Built-in position provider for the generator, so a table can be produced
//! without downloading ephemeris kernels.
//! Accuracy: ~0.01° for the sun, ~0.1° (≈700 km) for the moon; shadow angles
//! are therefore good to a fraction of a degree, well below the decidegree
//! rounding noise of a quarter-hour interpolation on the consumer side.
//! References: J. Meeus, *Astronomical Algorithms* (2nd ed.), ch. 22, 25, 47;
//! mean sidereal time from ch. 12.
//!
//! Working frame: mean equator and equinox of date, kilometers, centered on
//! the sun. The sun's offset from the true solar-system barycenter (< 0.01 AU)
//! is ignored.

use chrono::{DateTime, Utc};
use core::f64::consts::TAU;
use glam::DVec3;

use crate::provider::{Body, GeodeticLocation, HorizonPosition, PositionProvider, ProviderError};

/// Astronomical unit in km
pub const AU_KM: f64 = 149_597_870.7;

/// Julian day of the Unix epoch (1970-01-01T00:00:00Z)
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian day of J2000.0
const J2000_JD: f64 = 2_451_545.0;

/// TT − UTC in seconds (32.184 s + leap seconds, frozen at the 2017 value)
const TT_MINUS_UTC_S: f64 = 69.184;

/// 1900-01-01T00:00:00Z
const SUPPORTED_FROM_UNIX: i64 = -2_208_988_800;

/// 2100-01-01T00:00:00Z (exclusive)
const SUPPORTED_UNTIL_UNIX: i64 = 4_102_444_800;

/// WGS84 equatorial radius in km
const WGS84_A_KM: f64 = 6378.137;

/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Analytic sun/earth/moon positions valid for 1900–2099.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPrecisionEphemeris {
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
}

impl Default for LowPrecisionEphemeris {
    fn default() -> Self {
        Self {
            valid_from: DateTime::from_timestamp(SUPPORTED_FROM_UNIX, 0)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            valid_until: DateTime::from_timestamp(SUPPORTED_UNTIL_UNIX, 0)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

impl LowPrecisionEphemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// First instant the theory is used for.
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// First instant past the supported window.
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }

    fn check_range(&self, instant: DateTime<Utc>) -> Result<(), ProviderError> {
        if instant < self.valid_from || instant >= self.valid_until {
            return Err(ProviderError::OutOfRange {
                instant,
                from: self.valid_from,
                until: self.valid_until,
            });
        }
        Ok(())
    }
}

impl PositionProvider for LowPrecisionEphemeris {
    fn position_at(&self, instant: DateTime<Utc>, body: Body) -> Result<DVec3, ProviderError> {
        self.check_range(instant)?;

        let t = julian_centuries_tt(julian_day_utc(instant));
        let earth = -sun_geocentric(t);

        Ok(match body {
            Body::Sun => DVec3::ZERO,
            Body::Earth => earth,
            Body::Moon => earth + moon_geocentric(t),
        })
    }

    fn horizon_position_at(
        &self,
        instant: DateTime<Utc>,
        body: Body,
        location: &GeodeticLocation,
    ) -> Result<HorizonPosition, ProviderError> {
        self.check_range(instant)?;

        let jd = julian_day_utc(instant);
        let t = julian_centuries_tt(jd);
        let geocentric = match body {
            Body::Sun => sun_geocentric(t),
            Body::Moon => moon_geocentric(t),
            Body::Earth => {
                return Err(ProviderError::UnsupportedBody {
                    body,
                    query: "horizon position",
                })
            }
        };

        // local sidereal angle of the observer meridian
        let theta = greenwich_mean_sidereal_time(jd) + location.longitude_deg.to_radians();

        // topocentric direction (includes lunar parallax, ~1°)
        let topocentric = (geocentric - observer_geocentric(location, theta))
            .try_normalize()
            .ok_or(ProviderError::InvalidPosition { body, instant })?;

        let (sin_phi, cos_phi) = location.latitude_deg.to_radians().sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        let zenith = DVec3::new(cos_phi * cos_theta, cos_phi * sin_theta, sin_phi);
        let north = DVec3::new(-sin_phi * cos_theta, -sin_phi * sin_theta, cos_phi);
        let east = DVec3::new(-sin_theta, cos_theta, 0.0);

        let altitude = topocentric.dot(zenith).clamp(-1.0, 1.0).asin();
        let azimuth = topocentric.dot(east).atan2(topocentric.dot(north));

        Ok(HorizonPosition {
            altitude_deg: altitude.to_degrees(),
            azimuth_deg: azimuth.to_degrees().rem_euclid(360.0),
        })
    }
}

/// Julian day (UTC) of an instant
pub fn julian_day_utc(instant: DateTime<Utc>) -> f64 {
    let seconds = instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Julian centuries of TT since J2000.0
fn julian_centuries_tt(jd_utc: f64) -> f64 {
    (jd_utc + TT_MINUS_UTC_S / 86_400.0 - J2000_JD) / 36_525.0
}

/// Mean obliquity of the ecliptic in radians (Meeus 22.2, linear term)
fn mean_obliquity(t: f64) -> f64 {
    (23.439_291 - 0.013_004_2 * t).to_radians()
}

/// Greenwich mean sidereal time in radians (Meeus 12.4)
fn greenwich_mean_sidereal_time(jd_ut: f64) -> f64 {
    let d = jd_ut - J2000_JD;
    let t = d / 36_525.0;
    let degrees =
        280.460_618_37 + 360.985_647_366_29 * d + t * t * (0.000_387_933 - t / 38_710_000.0);
    degrees.to_radians().rem_euclid(TAU)
}

/// Rotate ecliptic spherical coordinates into an equatorial cartesian vector
fn ecliptic_to_equatorial(lon: f64, lat: f64, distance: f64, obliquity: f64) -> DVec3 {
    let (sin_l, cos_l) = lon.sin_cos();
    let (sin_b, cos_b) = lat.sin_cos();
    let (sin_e, cos_e) = obliquity.sin_cos();

    DVec3::new(
        distance * cos_b * cos_l,
        distance * (cos_b * sin_l * cos_e - sin_b * sin_e),
        distance * (cos_b * sin_l * sin_e + sin_b * cos_e),
    )
}

/// Geocentric position of the observer in km, for local sidereal angle `theta`
fn observer_geocentric(location: &GeodeticLocation, theta: f64) -> DVec3 {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let (sin_phi, cos_phi) = location.latitude_deg.to_radians().sin_cos();
    let h = location.height_m / 1000.0;
    let n = WGS84_A_KM / (1.0 - e2 * sin_phi * sin_phi).sqrt();

    let rho_xy = (n + h) * cos_phi;
    DVec3::new(
        rho_xy * theta.cos(),
        rho_xy * theta.sin(),
        (n * (1.0 - e2) + h) * sin_phi,
    )
}

/// Geometric geocentric sun position in km (Meeus ch. 25, low accuracy)
fn sun_geocentric(t: f64) -> DVec3 {
    // Mean longitude & mean anomaly (degrees)
    let l0 = (280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t).rem_euclid(360.0);
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t).rem_euclid(360.0);
    let m_rad = m.to_radians();

    // Equation of center
    let c = (1.914_602 - 0.004_817 * t) * m_rad.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m_rad).sin()
        + 0.000_289 * (3.0 * m_rad).sin();

    let lon = (l0 + c).to_radians();

    // Radius vector from the true anomaly
    let e = 0.016_708_634 - 0.000_042_037 * t;
    let v = m_rad + c.to_radians();
    let r_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * v.cos());

    ecliptic_to_equatorial(lon, 0.0, r_au * AU_KM, mean_obliquity(t))
}

/// Geocentric moon position in km (Meeus ch. 47, largest terms only)
fn moon_geocentric(t: f64) -> DVec3 {
    // Fundamental arguments (degrees)
    let lp = (218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t).rem_euclid(360.0);
    let d = (297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t * t).rem_euclid(360.0);
    let m = (357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t * t).rem_euclid(360.0);
    let mp = (134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t * t).rem_euclid(360.0);
    let f = (93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t * t).rem_euclid(360.0);

    let d = d.to_radians();
    let m = m.to_radians();
    let mp = mp.to_radians();
    let f = f.to_radians();

    // Longitude terms, 1e-6 degree
    let sum_l = 6_288_774.0 * mp.sin()
        + 1_274_027.0 * (2.0 * d - mp).sin()
        + 658_314.0 * (2.0 * d).sin()
        + 213_618.0 * (2.0 * mp).sin()
        - 185_116.0 * m.sin()
        - 114_332.0 * (2.0 * f).sin()
        + 58_793.0 * (2.0 * d - 2.0 * mp).sin()
        + 57_066.0 * (2.0 * d - m - mp).sin()
        + 53_322.0 * (2.0 * d + mp).sin()
        + 45_758.0 * (2.0 * d - m).sin()
        - 40_923.0 * (m - mp).sin()
        - 34_720.0 * d.sin()
        - 30_383.0 * (m + mp).sin()
        + 15_327.0 * (2.0 * d - 2.0 * f).sin()
        - 12_528.0 * (mp + 2.0 * f).sin()
        + 10_980.0 * (mp - 2.0 * f).sin()
        + 10_675.0 * (4.0 * d - mp).sin()
        + 10_034.0 * (3.0 * mp).sin()
        + 8_548.0 * (4.0 * d - 2.0 * mp).sin()
        - 7_888.0 * (2.0 * d + m - mp).sin()
        - 6_766.0 * (2.0 * d + m).sin()
        - 5_163.0 * (d - mp).sin()
        + 4_987.0 * (d + m).sin()
        + 4_036.0 * (2.0 * d - m + mp).sin();

    // Latitude terms, 1e-6 degree
    let sum_b = 5_128_122.0 * f.sin()
        + 280_602.0 * (mp + f).sin()
        + 277_693.0 * (mp - f).sin()
        + 173_237.0 * (2.0 * d - f).sin()
        + 55_413.0 * (2.0 * d - mp + f).sin()
        + 46_271.0 * (2.0 * d - mp - f).sin()
        + 32_573.0 * (2.0 * d + f).sin()
        + 17_198.0 * (2.0 * mp + f).sin()
        + 9_266.0 * (2.0 * d + mp - f).sin()
        + 8_822.0 * (2.0 * mp - f).sin();

    // Distance terms, meters
    let sum_r = -20_905_355.0 * mp.cos()
        - 3_699_111.0 * (2.0 * d - mp).cos()
        - 2_955_968.0 * (2.0 * d).cos()
        - 569_925.0 * (2.0 * mp).cos()
        + 48_888.0 * m.cos()
        - 3_149.0 * (2.0 * f).cos()
        + 246_158.0 * (2.0 * d - 2.0 * mp).cos()
        - 152_138.0 * (2.0 * d - m - mp).cos()
        - 170_733.0 * (2.0 * d + mp).cos()
        - 204_586.0 * (2.0 * d - m).cos()
        - 129_620.0 * (m - mp).cos()
        + 108_743.0 * d.cos();

    let lon = (lp + sum_l / 1_000_000.0).to_radians();
    let lat = (sum_b / 1_000_000.0).to_radians();
    let distance_km = 385_000.56 + sum_r / 1_000.0;

    ecliptic_to_equatorial(lon, lat, distance_km, mean_obliquity(t))
}
