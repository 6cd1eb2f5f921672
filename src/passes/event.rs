use chrono::{DateTime, Utc};
use strum_macros::Display;

use crate::passes::PassError;

/// Rise, culmination and set, as reported by the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventKind {
    Start,
    Peak,
    End,
}

/// One observation point of a satellite's event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PassEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub sunlit: bool,
    pub elevation_deg: f64,
}

impl PassEvent {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind, sunlit: bool, elevation_deg: f64) -> Self {
        Self {
            timestamp,
            kind,
            sunlit,
            elevation_deg,
        }
    }
}

/// Zip the propagator's parallel lists into a single event stream.
///
/// The three inputs must be aligned one-to-one; a length mismatch is an
/// error rather than a silent truncation.
pub fn align_events(
    events: &[(DateTime<Utc>, EventKind)],
    sunlit: &[bool],
    elevations: &[f64],
) -> Result<Vec<PassEvent>, PassError> {
    if events.len() != sunlit.len() || events.len() != elevations.len() {
        return Err(PassError::MisalignedSamples {
            events: events.len(),
            sunlit: sunlit.len(),
            elevations: elevations.len(),
        });
    }

    Ok(events
        .iter()
        .zip(sunlit)
        .zip(elevations)
        .map(|((&(timestamp, kind), &sunlit), &elevation_deg)| {
            PassEvent::new(timestamp, kind, sunlit, elevation_deg)
        })
        .collect())
}
