use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::passes::{EventKind, PassRecord};

#[derive(Debug, Error)]
pub enum PassError {
    #[error("protocol violation for {satellite}: {kind} event at {at} rejected, {reason}")]
    ProtocolViolation {
        satellite: String,
        kind: EventKind,
        at: DateTime<Utc>,
        reason: &'static str,
    },
    #[error(
        "incomplete pass for {}: started {} with no set event before end of stream",
        .open.satellite(),
        .open.start()
    )]
    IncompletePass {
        completed: Vec<PassRecord>,
        open: Box<PassRecord>,
    },
    #[error("{field} not set on pass of {satellite}")]
    FieldNotSet {
        satellite: String,
        field: &'static str,
    },
    #[error("misaligned samples: {events} events, {sunlit} sunlit flags, {elevations} elevations")]
    MisalignedSamples {
        events: usize,
        sunlit: usize,
        elevations: usize,
    },
}
