use chrono::{DateTime, Utc};

use crate::predict::error::PredictError;
use crate::predict::{GroundStation, TleEntry};

/// Topocentric view of a satellite at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookSample {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Earth-centred inertial (TEME) position, for the shadow test.
    pub position_teme_km: [f64; 3],
}

pub fn look_at(
    station: &GroundStation,
    entry: &TleEntry,
    timestamp: DateTime<Utc>,
) -> Result<LookSample, PredictError> {
    let minutes = entry
        .elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;

    let prediction = entry
        .constants
        .propagate(minutes)
        .map_err(|e| PredictError::Propagation(format!("{}: {}", entry.name, e)))?;

    let gmst =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));
    let look = station.look_at_ecef(teme_to_ecef(prediction.position, gmst));

    Ok(LookSample {
        timestamp,
        azimuth_deg: look.azimuth_deg,
        elevation_deg: look.elevation_deg,
        range_km: look.range_km,
        position_teme_km: prediction.position,
    })
}

fn teme_to_ecef(pos: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos[0] * cos_gmst + pos[1] * sin_gmst,
        -pos[0] * sin_gmst + pos[1] * cos_gmst,
        pos[2],
    ]
}
