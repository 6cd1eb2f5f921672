use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::predict::GroundStation;
use crate::report::ReportParams;

const AMSAT_DAILY_TLE_URL: &str = "https://www.amsat.org/tle/current/dailytle.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub station: StationConfig,
    pub window: WindowConfig,
    pub watchlist: Vec<String>,
    pub min_elevation_deg: f64,
    /// IANA name of the civil timezone used by the local renderings.
    pub timezone: String,
    pub tle: TleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// `now`, `now+1h`, RFC3339, or RFC3339 with an offset.
    pub start: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TleConfig {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TleSource {
    Url(String),
    File(PathBuf),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station: StationConfig {
                name: Some("Camp Snyder".to_string()),
                coordinates: "38.8287618,-77.666188".to_string(),
                altitude_m: 0.0,
            },
            window: WindowConfig::default(),
            watchlist: [
                "AO-07",
                "AO-91",
                "CAS-4B",
                "EO-88",
                "IO-117",
                "IO-86",
                "ISS",
                "JO-97",
                "LILACSAT-2",
                "PO-101",
                "RS-44",
                "Tevel-1",
                "Tevel-2",
                "Tevel-3",
                "Tevel-4",
                "Tevel-5",
                "Tevel-6",
                "XW-2B",
                "XW-2C",
                "XW-2D",
                "XW-2E",
                "XW-2F",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_elevation_deg: 1.0,
            timezone: "America/New_York".to_string(),
            tle: TleConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: "2023-07-21T10:00:00Z".to_string(),
            duration: "14h".to_string(),
        }
    }
}

impl TleConfig {
    pub fn source(&self) -> Result<TleSource, ConfigError> {
        match (&self.url, &self.file) {
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "tle: set either url or file, not both".into(),
            )),
            (None, Some(file)) => Ok(TleSource::File(file.clone())),
            (Some(url), None) => Ok(TleSource::Url(url.clone())),
            (None, None) => Ok(TleSource::Url(AMSAT_DAILY_TLE_URL.to_string())),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.station()?;
        self.timezone()?;
        self.tle.source()?;
        self.window(Utc::now())?;

        if self.watchlist.is_empty() {
            return Err(ConfigError::Invalid("watchlist is empty".into()));
        }
        if !(-90.0..=90.0).contains(&self.min_elevation_deg) {
            return Err(ConfigError::Invalid(format!(
                "min_elevation_deg out of range: {}",
                self.min_elevation_deg
            )));
        }
        Ok(())
    }

    pub fn station(&self) -> Result<GroundStation, ConfigError> {
        GroundStation::from_coordinates(&self.station.coordinates, self.station.altitude_m)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "invalid station coordinates: {}",
                    self.station.coordinates
                ))
            })
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid(format!("timezone {}: {}", self.timezone, e)))
    }

    /// Resolve the observation window, `now` being the reference for relative starts.
    pub fn window(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), ConfigError> {
        let invalid = |e: String| ConfigError::Invalid(format!("window: {}", e));
        let start = parse_start(&self.window.start, now).map_err(invalid)?;
        let duration = parse_duration(&self.window.duration).map_err(invalid)?;

        if duration <= Duration::zero() {
            return Err(invalid("duration must be positive".into()));
        }
        Ok((start, start + duration))
    }

    pub fn report_params(&self, now: DateTime<Utc>) -> Result<ReportParams, ConfigError> {
        let (start, end) = self.window(now)?;
        Ok(ReportParams {
            start,
            end,
            min_elevation_deg: self.min_elevation_deg,
            timezone: self.timezone()?,
        })
    }
}

fn parse_start(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    // Relative: now, now+2h, now-30m
    if let Some(rest) = s.strip_prefix("now") {
        let rest = rest.trim();
        if rest.is_empty() {
            return Ok(now);
        }
        return apply_offset(now, rest);
    }

    // Absolute with offset: 2023-07-21T10:00:00Z + 1h
    if let Some(idx) = s.rfind(['+', '-']) {
        if idx > 10 {
            if let Ok(base) = DateTime::parse_from_rfc3339(s[..idx].trim()) {
                return apply_offset(base.with_timezone(&Utc), &s[idx..]);
            }
        }
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("{}: {}", s, e))
}

fn apply_offset(base: DateTime<Utc>, offset: &str) -> Result<DateTime<Utc>, String> {
    let offset = offset.trim();
    let (neg, rest) = match offset.strip_prefix('-') {
        Some(r) => (true, r),
        None => (
            false,
            offset
                .strip_prefix('+')
                .ok_or_else(|| format!("expected +/- offset, got {}", offset))?,
        ),
    };
    let dur = parse_duration(rest)?;
    Ok(if neg { base - dur } else { base + dur })
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| format!("{}: {}", s.trim(), e))
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        config.validate().unwrap();

        let (start, end) = config.window(now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 7, 21, 10, 0, 0).unwrap());
        assert_eq!(end - start, Duration::hours(14));
        assert_eq!(config.watchlist.len(), 22);
        assert_eq!(config.timezone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(
            config.tle.source().unwrap(),
            TleSource::Url(AMSAT_DAILY_TLE_URL.to_string())
        );
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
station:
  name: Alexandria
  coordinates: "38.766970,-77.151200"
  altitude_m: 20
window:
  start: now+1h
  duration: 6h
watchlist: [ISS, RS-44]
min_elevation_deg: 10
timezone: Europe/Madrid
tle:
  file: ./dailytle.txt
"#;
        let config = Config::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.station.name.as_deref(), Some("Alexandria"));
        assert_eq!(config.watchlist, vec!["ISS", "RS-44"]);
        assert_eq!(
            config.tle.source().unwrap(),
            TleSource::File(PathBuf::from("./dailytle.txt"))
        );

        let params = config.report_params(now()).unwrap();
        assert_eq!(params.start, now() + Duration::hours(1));
        assert_eq!(params.end, now() + Duration::hours(7));
        assert_eq!(params.min_elevation_deg, 10.0);
        assert_eq!(params.timezone, chrono_tz::Europe::Madrid);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = Config::from_str(include_str!("../pass-o-mat.yaml")).unwrap();
        let defaults = Config::default();
        config.validate().unwrap();

        assert_eq!(config.watchlist, defaults.watchlist);
        assert_eq!(config.window(now()).unwrap(), defaults.window(now()).unwrap());
        assert_eq!(config.station().unwrap(), defaults.station().unwrap());
        assert_eq!(config.tle.source().unwrap(), defaults.tle.source().unwrap());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_str("watchlist: [AO-91]\n").unwrap();
        assert_eq!(config.watchlist, vec!["AO-91"]);
        assert_eq!(config.min_elevation_deg, 1.0);
        assert_eq!(config.window.duration, "14h");
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = Config::default();
        config.timezone = "Mars/Olympus_Mons".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.station.coordinates = "somewhere".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watchlist.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.duration = "0s".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tle.url = Some("http://example.org/tle.txt".into());
        config.tle.file = Some(PathBuf::from("tle.txt"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_start() {
        assert_eq!(parse_start("now", now()).unwrap(), now());
        assert_eq!(
            parse_start("now-30m", now()).unwrap(),
            now() - Duration::minutes(30)
        );
        assert_eq!(
            parse_start("2023-07-21T10:00:00Z", now()).unwrap(),
            Utc.with_ymd_and_hms(2023, 7, 21, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_start("2023-07-21T10:00:00Z + 90m", now()).unwrap(),
            Utc.with_ymd_and_hms(2023, 7, 21, 11, 30, 0).unwrap()
        );
        assert_eq!(
            parse_start("2023-07-21T06:00:00-04:00", now()).unwrap(),
            Utc.with_ymd_and_hms(2023, 7, 21, 10, 0, 0).unwrap()
        );
        assert!(parse_start("tomorrow", now()).is_err());
        assert!(parse_start("now*2", now()).is_err());
    }
}
