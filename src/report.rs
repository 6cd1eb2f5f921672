use std::io::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use strum_macros::Display;
use thiserror::Error;

use crate::passes::{align_events, reduce_events, PassError, PassRecord};
use crate::predict::{find_events, sample_events, GroundStation, PredictError, TleCatalog, TleEntry};

pub const HEADER_FIELDS: [&str; 7] = [
    "Start of Pass",
    "Max Elevation Time",
    "End of Pass",
    "Satellite",
    "Max Elevation",
    "Pass Duration",
    "Notes",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Pass(#[from] PassError),
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ReportFormat {
    /// Tab separated, local time
    Tab,
    /// Comma separated, local time
    Csv,
    /// Tab separated, UTC
    TabUtc,
    /// Comma separated, UTC
    CsvUtc,
    /// One JSON object per pass
    Json,
}

impl ReportFormat {
    fn separator(&self) -> Option<&'static str> {
        match self {
            ReportFormat::Tab | ReportFormat::TabUtc => Some("\t"),
            ReportFormat::Csv | ReportFormat::CsvUtc => Some(","),
            ReportFormat::Json => None,
        }
    }

    pub fn header(&self) -> Option<String> {
        self.separator().map(|sep| HEADER_FIELDS.join(sep))
    }

    pub fn render(&self, pass: &PassRecord, tz: Tz) -> Result<String, ReportError> {
        Ok(match self {
            ReportFormat::Tab => pass.to_tab(tz)?,
            ReportFormat::Csv => pass.to_csv(tz)?,
            ReportFormat::TabUtc => pass.to_tab_utc()?,
            ReportFormat::CsvUtc => pass.to_csv_utc()?,
            ReportFormat::Json => serde_json::to_string(pass)?,
        })
    }
}

/// The only configuration the prediction core sees.
#[derive(Debug, Clone, Copy)]
pub struct ReportParams {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_elevation_deg: f64,
    pub timezone: Tz,
}

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub satellites: usize,
    pub passes: usize,
    pub incomplete: usize,
    pub missing: Vec<String>,
}

/// Completed passes of one satellite, plus the pass left open at the end
/// of the window, if any.
pub fn predict_satellite(
    station: &GroundStation,
    entry: &TleEntry,
    params: &ReportParams,
) -> Result<(Vec<PassRecord>, Option<PassRecord>), ReportError> {
    let events = find_events(
        station,
        entry,
        params.start,
        params.end,
        params.min_elevation_deg,
    )?;
    let (sunlit, elevations) = sample_events(station, entry, &events)?;
    let stream = align_events(&events, &sunlit, &elevations)?;

    match reduce_events(&entry.name, stream) {
        Ok(passes) => Ok((passes, None)),
        Err(PassError::IncompletePass { completed, open }) => Ok((completed, Some(*open))),
        Err(e) => Err(e.into()),
    }
}

/// Predict and write passes for every watched satellite, in watchlist order.
pub fn run_report<W: Write>(
    station: &GroundStation,
    watchlist: &[String],
    catalog: &TleCatalog,
    params: &ReportParams,
    format: ReportFormat,
    out: &mut W,
) -> Result<ReportSummary, ReportError> {
    let mut summary = ReportSummary::default();

    if let Some(header) = format.header() {
        writeln!(out, "{}", header)?;
    }

    for name in watchlist {
        let entry = match catalog.get(name) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("{}", e);
                summary.missing.push(name.clone());
                continue;
            }
        };

        log::debug!("{}: NORAD {} from {}", name, entry.norad_id, catalog.source());
        let (passes, open) = predict_satellite(station, entry, params)?;
        if let Some(open) = open {
            log::warn!(
                "{}: pass starting {} is still in progress at {}, not reported",
                name,
                open.start(),
                params.end
            );
            summary.incomplete += 1;
        }

        log::info!("{}: {} passes", name, passes.len());
        for pass in &passes {
            writeln!(out, "{}", format.render(pass, params.timezone)?)?;
        }

        summary.satellites += 1;
        summary.passes += passes.len();
    }

    out.flush()?;
    Ok(summary)
}
