use chrono::{DateTime, Utc};

use crate::passes::{EventKind, PassError, PassEvent, PassRecord};

#[derive(Debug)]
enum State {
    Idle,
    Open(PassRecord),
}

/// Folds one satellite's rise/peak/set stream into completed passes.
///
/// At most one pass is open at a time. Any event that does not fit the
/// `START PEAK END` ordering is a protocol violation: the reducer never
/// overwrites an open pass and never invents a missing one. Timestamps
/// must strictly increase across the whole stream, so passes come out in
/// time order and never overlap.
#[derive(Debug)]
pub struct PassReducer {
    satellite: String,
    state: State,
    completed: Vec<PassRecord>,
    last_end: Option<DateTime<Utc>>,
}

impl PassReducer {
    pub fn new(satellite: &str) -> Self {
        Self {
            satellite: satellite.to_string(),
            state: State::Idle,
            completed: Vec::new(),
            last_end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    pub fn push(&mut self, event: PassEvent) -> Result<(), PassError> {
        match event.kind {
            EventKind::Start => {
                if self.is_open() {
                    return Err(violation(&self.satellite, &event, "a pass is already open"));
                }
                if self.last_end.is_some_and(|end| event.timestamp <= end) {
                    return Err(violation(&self.satellite, &event, "events are out of order"));
                }
                log::debug!("{}: pass opened at {}", self.satellite, event.timestamp);
                self.state = State::Open(PassRecord::open(
                    &self.satellite,
                    event.timestamp,
                    event.sunlit,
                ));
            }
            EventKind::Peak => {
                self.open_record(&event)?
                    .mark_peak(event.timestamp, event.elevation_deg, event.sunlit);
            }
            EventKind::End => {
                self.open_record(&event)?.close(event.timestamp, event.sunlit);
                if let State::Open(record) = std::mem::replace(&mut self.state, State::Idle) {
                    log::debug!(
                        "{}: pass closed at {} (possible eclipse: {})",
                        self.satellite,
                        event.timestamp,
                        record.possible_eclipse()
                    );
                    self.last_end = Some(event.timestamp);
                    self.completed.push(record);
                }
            }
        }

        Ok(())
    }

    /// Ends the stream. A pass still open here is reported as incomplete,
    /// together with everything completed before it.
    pub fn finish(self) -> Result<Vec<PassRecord>, PassError> {
        match self.state {
            State::Idle => Ok(self.completed),
            State::Open(record) => Err(PassError::IncompletePass {
                completed: self.completed,
                open: Box::new(record),
            }),
        }
    }

    fn open_record(&mut self, event: &PassEvent) -> Result<&mut PassRecord, PassError> {
        let record = match &mut self.state {
            State::Open(record) => record,
            State::Idle => return Err(violation(&self.satellite, event, "no pass is open")),
        };

        if event.timestamp <= record.latest() {
            return Err(violation(&self.satellite, event, "events are out of order"));
        }
        if event.kind == EventKind::Peak && record.peak().is_some() {
            return Err(violation(&self.satellite, event, "the pass already has a peak"));
        }

        Ok(record)
    }
}

fn violation(satellite: &str, event: &PassEvent, reason: &'static str) -> PassError {
    PassError::ProtocolViolation {
        satellite: satellite.to_string(),
        kind: event.kind,
        at: event.timestamp,
        reason,
    }
}

/// Reduce a complete event stream for one satellite.
pub fn reduce_events<I>(satellite: &str, events: I) -> Result<Vec<PassRecord>, PassError>
where
    I: IntoIterator<Item = PassEvent>,
{
    let mut reducer = PassReducer::new(satellite);
    for event in events {
        reducer.push(event)?;
    }
    reducer.finish()
}
