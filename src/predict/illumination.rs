//! Sun position and Earth-shadow test.
//!
//! The solar position uses the low-precision formulae of the Astronomical
//! Almanac (about 0.01 degree over 1950-2050), in the mean equator and
//! equinox of date. That is close enough to TEME for a shadow test at LEO
//! distances.

use chrono::{DateTime, Utc};

const AU_KM: f64 = 149_597_870.7;
const EARTH_RADIUS_KM: f64 = 6378.137;
const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Geocentric Sun position in km, equatorial frame of date.
pub fn sun_position_km(timestamp: DateTime<Utc>) -> [f64; 3] {
    let jd = timestamp.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JD;
    let n = jd - J2000_JD;

    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();
    let distance_km = AU_KM
        * (1.000_14 - 0.016_71 * mean_anomaly.cos() - 0.000_14 * (2.0 * mean_anomaly).cos());

    let (sin_lon, cos_lon) = ecliptic_longitude.sin_cos();
    [
        distance_km * cos_lon,
        distance_km * obliquity.cos() * sin_lon,
        distance_km * obliquity.sin() * sin_lon,
    ]
}

/// True unless the Earth blocks the line from the satellite to the Sun's centre.
pub fn is_sunlit(sat_km: [f64; 3], sun_km: [f64; 3]) -> bool {
    let d = [sun_km[0] - sat_km[0], sun_km[1] - sat_km[1], sun_km[2] - sat_km[2]];
    let d_norm = dot(d, d).sqrt();
    if d_norm == 0.0 {
        return true;
    }
    let u = [d[0] / d_norm, d[1] / d_norm, d[2] / d_norm];

    // Distance along the sunward ray to the point closest to Earth's centre.
    let t = -dot(sat_km, u);
    if t <= 0.0 {
        return true;
    }

    let closest_sq = dot(sat_km, sat_km) - t * t;
    closest_sq > EARTH_RADIUS_KM * EARTH_RADIUS_KM
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
