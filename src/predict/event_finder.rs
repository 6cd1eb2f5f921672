use chrono::{DateTime, Duration, Utc};

use crate::passes::EventKind;
use crate::predict::error::PredictError;
use crate::predict::{is_sunlit, look_at, sun_position_km, GroundStation, TleEntry};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement

#[derive(Debug, Clone, Copy)]
struct Culmination {
    time: DateTime<Utc>,
    elevation_deg: f64,
}

/// Find rise, culmination and set events of one satellite within `[start, end]`.
///
/// A pass already in progress at `start` is skipped, so the stream always
/// opens with a rise. A pass still in progress at `end` is emitted without
/// its set event. Each pass carries exactly one peak: the first instant of
/// maximal elevation.
pub fn find_events(
    station: &GroundStation,
    entry: &TleEntry,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation_deg: f64,
) -> Result<Vec<(DateTime<Utc>, EventKind)>, PredictError> {
    let elevation = |t: DateTime<Utc>| look_at(station, entry, t).map(|s| s.elevation_deg);
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);

    let mut events = Vec::new();
    let mut cursor = start;
    let mut prev: Option<(DateTime<Utc>, f64)> = None;
    let mut rise: Option<DateTime<Utc>> = None;
    let mut best: Option<Culmination> = None;

    loop {
        let el = elevation(cursor)?;
        let visible = el >= min_elevation_deg;

        match prev {
            None if visible => {
                log::debug!(
                    "{}: pass in progress at window start, skipping until it sets",
                    entry.name
                );
            }
            None => {}
            Some((prev_time, prev_el)) => {
                let was_visible = prev_el >= min_elevation_deg;

                if visible && !was_visible {
                    let aos =
                        refine_crossing(&elevation, prev_time, cursor, min_elevation_deg, true)?;
                    events.push((aos, EventKind::Start));
                    rise = Some(aos);
                    best = Some(Culmination {
                        time: cursor,
                        elevation_deg: el,
                    });
                } else if visible {
                    if let Some(b) = best.as_mut() {
                        if el > b.elevation_deg {
                            *b = Culmination {
                                time: cursor,
                                elevation_deg: el,
                            };
                        }
                    }
                } else if was_visible {
                    if let (Some(aos), Some(b)) = (rise.take(), best.take()) {
                        let los = refine_crossing(
                            &elevation,
                            prev_time,
                            cursor,
                            min_elevation_deg,
                            false,
                        )?;
                        let lo = (b.time - coarse_step).max(aos);
                        let hi = (b.time + coarse_step).min(los);
                        events.push((refine_peak(&elevation, lo, hi)?, EventKind::Peak));
                        events.push((los, EventKind::End));
                    }
                }
            }
        }

        prev = Some((cursor, el));
        if cursor >= end {
            break;
        }
        cursor = (cursor + coarse_step).min(end);
    }

    // Pass still above the threshold at the end of the window: report the
    // peak only once the elevation has started to drop.
    if let (Some(aos), Some(b)) = (rise, best) {
        if b.time < cursor {
            let lo = (b.time - coarse_step).max(aos);
            let hi = (b.time + coarse_step).min(end);
            events.push((refine_peak(&elevation, lo, hi)?, EventKind::Peak));
        }
        log::debug!("{}: pass rising at {} has not set by {}", entry.name, aos, end);
    }

    Ok(events)
}

/// Elevation and sunlit state at each event, aligned one-to-one with `events`.
pub fn sample_events(
    station: &GroundStation,
    entry: &TleEntry,
    events: &[(DateTime<Utc>, EventKind)],
) -> Result<(Vec<bool>, Vec<f64>), PredictError> {
    let mut sunlit = Vec::with_capacity(events.len());
    let mut elevations = Vec::with_capacity(events.len());

    for &(timestamp, kind) in events {
        let sample = look_at(station, entry, timestamp)?;
        log::trace!(
            "{}: {} at {}, az {:.1}° el {:.2}° range {:.0} km",
            entry.name,
            kind,
            sample.timestamp,
            sample.azimuth_deg,
            sample.elevation_deg,
            sample.range_km
        );
        sunlit.push(is_sunlit(sample.position_teme_km, sun_position_km(timestamp)));
        elevations.push(sample.elevation_deg);
    }

    Ok((sunlit, elevations))
}

/// Binary search for the threshold crossing between two samples.
fn refine_crossing<F>(
    elevation: &F,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    threshold_deg: f64,
    rising: bool,
) -> Result<DateTime<Utc>, PredictError>
where
    F: Fn(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = elevation(mid)? >= threshold_deg;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    // First instant above the threshold on a rise, last one on a set.
    Ok(if rising { high } else { low })
}

/// Ternary search for the elevation maximum in `[lo, hi]`. Ties move the
/// upper bound, so the earliest maximum wins.
fn refine_peak<F>(
    elevation: &F,
    mut lo: DateTime<Utc>,
    mut hi: DateTime<Utc>,
) -> Result<DateTime<Utc>, PredictError>
where
    F: Fn(DateTime<Utc>) -> Result<f64, PredictError>,
{
    while (hi - lo).num_seconds() > 2 * FINE_STEP_SECONDS {
        let third = (hi - lo) / 3;
        let m1 = lo + third;
        let m2 = hi - third;
        if elevation(m1)? < elevation(m2)? {
            lo = m1;
        } else {
            hi = m2;
        }
    }

    Ok(lo + (hi - lo) / 2)
}
