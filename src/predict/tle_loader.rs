use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;

const FETCH_TIMEOUT_SECONDS: u64 = 30;

/// One satellite of the catalog, ready for propagation.
pub struct TleEntry {
    pub name: String,
    pub norad_id: u64,
    pub elements: Elements,
    pub constants: Constants,
}

/// TLE catalog keyed by satellite name, loaded once per run.
pub struct TleCatalog {
    source: String,
    satellites: HashMap<String, TleEntry>,
}

impl TleCatalog {
    /// Parse a catalog from TLE text (2-line or 3-line sets, mixed).
    ///
    /// Sets that sgp4 rejects are skipped with a warning.
    pub fn from_text(content: &str, source: &str) -> Result<Self, PredictError> {
        let mut satellites = HashMap::new();

        for (name, line1, line2) in parse_multi_tle(content) {
            match parse_entry(name, &line1, &line2) {
                Ok(entry) => {
                    if satellites.contains_key(&entry.name) {
                        log::debug!("Duplicate TLE for {} in {}, keeping the last", entry.name, source);
                    }
                    satellites.insert(entry.name.clone(), entry);
                }
                Err(e) => log::warn!("Skipping TLE in {}: {}", source, e),
            }
        }

        if satellites.is_empty() {
            return Err(PredictError::NoSatellites(source.to_string()));
        }

        log::info!("Loaded {} satellites from {}", satellites.len(), source);
        Ok(Self {
            source: source.to_string(),
            satellites,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, PredictError> {
        let content = fs::read_to_string(path)?;
        Self::from_text(&content, &path.display().to_string())
    }

    /// Download the catalog once. No retry: a failed fetch fails the run.
    pub fn fetch(url: &str) -> Result<Self, PredictError> {
        log::info!("Fetching TLE catalog from {}", url);
        let fetch_err = |source| PredictError::Fetch {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECONDS))
            .build()
            .map_err(fetch_err)?;

        let content = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(fetch_err)?;

        Self::from_text(&content, url)
    }

    pub fn get(&self, name: &str) -> Result<&TleEntry, PredictError> {
        self.satellites
            .get(name.trim())
            .ok_or_else(|| PredictError::SatelliteNotFound(name.to_string()))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn parse_entry(name: Option<String>, line1: &str, line2: &str) -> Result<TleEntry, PredictError> {
    let label = name.clone().unwrap_or_else(|| line1.to_string());
    let invalid = |message: String| PredictError::InvalidTle {
        name: label.clone(),
        message,
    };

    let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
        .map_err(|e| invalid(e.to_string()))?;
    let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

    let name = name.unwrap_or_else(|| format!("NORAD {}", elements.norad_id));

    Ok(TleEntry {
        name,
        norad_id: elements.norad_id,
        elements,
        constants,
    })
}

/// Split catalog text into `(name, line1, line2)` sets.
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ISS_LINE1: &str =
        "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    pub(crate) const ISS_LINE2: &str =
        "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    pub(crate) fn iss_catalog() -> TleCatalog {
        let text = format!("ISS (ZARYA)\n{}\n{}\n", ISS_LINE1, ISS_LINE2);
        TleCatalog::from_text(&text, "test").unwrap()
    }

    #[test]
    fn test_parse_multi_tle_mixed() {
        let text = format!(
            "ISS (ZARYA)\n{l1}\n{l2}\n\n{l1}\n{l2}\nstray line\n",
            l1 = ISS_LINE1,
            l2 = ISS_LINE2
        );
        let sets = parse_multi_tle(&text);

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].0.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(sets[1].0, None);
        assert_eq!(sets[1].2, ISS_LINE2);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = iss_catalog();
        assert_eq!(catalog.source(), "test");

        let entry = catalog.get("ISS (ZARYA)").unwrap();
        assert_eq!(entry.norad_id, 25544);
        assert!(catalog.get("  ISS (ZARYA) ").is_ok());
    }

    #[test]
    fn test_unnamed_set_keyed_by_norad_id() {
        let text = format!("{}\n{}\n", ISS_LINE1, ISS_LINE2);
        let catalog = TleCatalog::from_text(&text, "test").unwrap();
        assert!(catalog.get("NORAD 25544").is_ok());
    }

    #[test]
    fn test_missing_satellite() {
        let catalog = iss_catalog();
        match catalog.get("AO-07") {
            Err(PredictError::SatelliteNotFound(name)) => assert_eq!(name, "AO-07"),
            _ => panic!("expected SatelliteNotFound"),
        }
    }

    #[test]
    fn test_bad_set_is_skipped() {
        let text = format!(
            "BROKEN\n1 00000U short\n2 00000 short\nISS (ZARYA)\n{}\n{}\n",
            ISS_LINE1, ISS_LINE2
        );
        let catalog = TleCatalog::from_text(&text, "test").unwrap();
        assert!(catalog.get("ISS (ZARYA)").is_ok());
        assert!(catalog.get("BROKEN").is_err());
    }

    #[test]
    fn test_empty_catalog() {
        assert!(matches!(
            TleCatalog::from_text("no tle here\n", "empty"),
            Err(PredictError::NoSatellites(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dailytle.txt");
        fs::write(&path, format!("AO-91\n{}\n{}\n", ISS_LINE1, ISS_LINE2)).unwrap();

        let catalog = TleCatalog::from_file(&path).unwrap();
        assert!(catalog.get("AO-91").is_ok());
        assert!(TleCatalog::from_file(&dir.path().join("missing.txt")).is_err());
    }
}
