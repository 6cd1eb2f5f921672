use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::passes::PassError;

/// Timestamp layout shared by every tabular rendering, e.g. `2023 Jul 21 06:05:00`.
pub const TIME_FORMAT: &str = "%Y %b %d %H:%M:%S";

/// Note attached to passes where the satellite was in shadow at least once.
pub const ECLIPSE_NOTE: &str = "*Possible Eclipse*";

/// Culmination of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub time: DateTime<Utc>,
    pub elevation_deg: f64,
}

/// One contiguous visibility window of one satellite.
///
/// Created on the rise event and completed on the set event. Only the
/// reducer mutates a record; once closed it is read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassRecord {
    satellite: String,
    start: DateTime<Utc>,
    peak: Option<Peak>,
    end: Option<DateTime<Utc>>,
    possible_eclipse: bool,
}

impl PassRecord {
    pub(crate) fn open(satellite: &str, start: DateTime<Utc>, sunlit: bool) -> Self {
        Self {
            satellite: satellite.to_string(),
            start,
            peak: None,
            end: None,
            possible_eclipse: !sunlit,
        }
    }

    pub(crate) fn mark_peak(&mut self, time: DateTime<Utc>, elevation_deg: f64, sunlit: bool) {
        self.peak = Some(Peak {
            time,
            elevation_deg,
        });
        self.possible_eclipse |= !sunlit;
    }

    pub(crate) fn close(&mut self, time: DateTime<Utc>, sunlit: bool) {
        self.end = Some(time);
        self.possible_eclipse |= !sunlit;
    }

    /// Timestamp of the most recent event applied to this record.
    pub(crate) fn latest(&self) -> DateTime<Utc> {
        self.end
            .or(self.peak.map(|p| p.time))
            .unwrap_or(self.start)
    }

    pub fn satellite(&self) -> &str {
        &self.satellite
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn peak(&self) -> Option<Peak> {
        self.peak
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn possible_eclipse(&self) -> bool {
        self.possible_eclipse
    }

    pub fn duration(&self) -> Result<Duration, PassError> {
        Ok(self.require_end()? - self.start)
    }

    /// Duration as `"{M} Minutes {S} Seconds"`.
    ///
    /// The total is rounded to the nearest whole second (half away from
    /// zero) before splitting, so the seconds field never reads 60.
    pub fn duration_text(&self) -> Result<String, PassError> {
        let millis = self.duration()?.num_milliseconds();
        let total_secs = (millis as f64 / 1000.0).round() as i64;
        Ok(format!(
            "{} Minutes {} Seconds",
            total_secs / 60,
            total_secs % 60
        ))
    }

    pub fn peak_elevation_text(&self) -> Result<String, PassError> {
        Ok(format_elevation(self.require_peak()?.elevation_deg))
    }

    pub fn eclipse_note(&self) -> &'static str {
        if self.possible_eclipse {
            ECLIPSE_NOTE
        } else {
            ""
        }
    }

    pub fn to_tab(&self, tz: Tz) -> Result<String, PassError> {
        self.row(|t| format_local(t, tz), "\t")
    }

    pub fn to_csv(&self, tz: Tz) -> Result<String, PassError> {
        self.row(|t| format_local(t, tz), ",")
    }

    pub fn to_tab_utc(&self) -> Result<String, PassError> {
        self.row(format_utc, "\t")
    }

    pub fn to_csv_utc(&self) -> Result<String, PassError> {
        self.row(format_utc, ",")
    }

    fn row(
        &self,
        format_time: impl Fn(DateTime<Utc>) -> String,
        separator: &str,
    ) -> Result<String, PassError> {
        let peak = self.require_peak()?;
        let end = self.require_end()?;

        let fields = [
            format_time(self.start),
            format_time(peak.time),
            format_time(end),
            self.satellite.clone(),
            self.peak_elevation_text()?,
            self.duration_text()?,
            self.eclipse_note().to_string(),
        ];
        Ok(fields.join(separator))
    }

    fn require_peak(&self) -> Result<Peak, PassError> {
        self.peak().ok_or_else(|| self.not_set("peak"))
    }

    fn require_end(&self) -> Result<DateTime<Utc>, PassError> {
        self.end().ok_or_else(|| self.not_set("end"))
    }

    fn not_set(&self, field: &'static str) -> PassError {
        PassError::FieldNotSet {
            satellite: self.satellite.clone(),
            field,
        }
    }
}

fn format_local(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format(TIME_FORMAT).to_string()
}

fn format_utc(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn format_elevation(deg: f64) -> String {
    format!("{:.2}°", deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 7, 21, 10, 0, 0).unwrap()
    }

    fn sample_pass(sunlit: [bool; 3]) -> PassRecord {
        let mut pass = PassRecord::open("AO-91", t0(), sunlit[0]);
        pass.mark_peak(t0() + Duration::minutes(5), 42.37, sunlit[1]);
        pass.close(t0() + Duration::minutes(10), sunlit[2]);
        pass
    }

    fn pass_lasting(millis: i64) -> PassRecord {
        let mut pass = PassRecord::open("ISS", t0(), true);
        pass.mark_peak(t0() + Duration::milliseconds(millis / 2), 10.0, true);
        pass.close(t0() + Duration::milliseconds(millis), true);
        pass
    }

    #[test]
    fn test_duration() {
        let pass = sample_pass([true; 3]);
        assert_eq!(pass.duration().unwrap(), Duration::minutes(10));
        assert_eq!(pass.duration_text().unwrap(), "10 Minutes 0 Seconds");
    }

    #[test]
    fn test_duration_text_rounding() {
        assert_eq!(
            pass_lasting(125_400).duration_text().unwrap(),
            "2 Minutes 5 Seconds"
        );
        assert_eq!(
            pass_lasting(89_500).duration_text().unwrap(),
            "1 Minutes 30 Seconds"
        );
        assert_eq!(
            pass_lasting(119_600).duration_text().unwrap(),
            "2 Minutes 0 Seconds"
        );
        assert_eq!(pass_lasting(59_000).duration_text().unwrap(), "0 Minutes 59 Seconds");
    }

    #[test]
    fn test_duration_text_is_stable() {
        let pass = pass_lasting(421_730);
        assert_eq!(pass.duration_text().unwrap(), pass.duration_text().unwrap());
    }

    #[test]
    fn test_open_pass_has_no_duration() {
        let pass = PassRecord::open("AO-91", t0(), true);
        assert_eq!(pass.end(), None);
        assert!(matches!(
            pass.duration(),
            Err(PassError::FieldNotSet { field: "end", .. })
        ));
        assert!(pass.duration_text().is_err());
        assert!(pass.to_tab_utc().is_err());
    }

    #[test]
    fn test_render_without_peak() {
        let mut pass = PassRecord::open("AO-91", t0(), true);
        pass.close(t0() + Duration::minutes(10), true);

        assert!(pass.duration().is_ok());
        assert!(matches!(
            pass.to_csv(New_York),
            Err(PassError::FieldNotSet { field: "peak", .. })
        ));
    }

    #[test]
    fn test_eclipse_flag_accumulates() {
        assert!(!sample_pass([true, true, true]).possible_eclipse());
        assert!(sample_pass([false, true, true]).possible_eclipse());
        assert!(sample_pass([true, false, true]).possible_eclipse());
        assert!(sample_pass([true, true, false]).possible_eclipse());
        assert!(sample_pass([false, false, false]).possible_eclipse());
    }

    #[test]
    fn test_to_tab_local() {
        let pass = sample_pass([false, true, true]);
        assert_eq!(
            pass.to_tab(New_York).unwrap(),
            "2023 Jul 21 06:00:00\t2023 Jul 21 06:05:00\t2023 Jul 21 06:10:00\tAO-91\t42.37°\t10 Minutes 0 Seconds\t*Possible Eclipse*"
        );
    }

    #[test]
    fn test_to_csv_utc() {
        let pass = sample_pass([true; 3]);
        assert_eq!(
            pass.to_csv_utc().unwrap(),
            "2023 Jul 21 10:00:00,2023 Jul 21 10:05:00,2023 Jul 21 10:10:00,AO-91,42.37°,10 Minutes 0 Seconds,"
        );
    }

    #[test]
    fn test_tab_and_csv_carry_same_fields() {
        let pass = sample_pass([true, false, true]);

        let tab = pass.to_tab(New_York).unwrap();
        let csv = pass.to_csv(New_York).unwrap();
        assert_eq!(tab.split('\t').collect::<Vec<_>>(), csv.split(',').collect::<Vec<_>>());

        let tab_utc = pass.to_tab_utc().unwrap();
        let local: Vec<_> = tab.split('\t').collect();
        let utc: Vec<_> = tab_utc.split('\t').collect();
        assert_eq!(local.len(), 7);
        assert_eq!(utc.len(), 7);
        for i in 0..3 {
            assert_ne!(local[i], utc[i]);
        }
        assert_eq!(&local[3..], &utc[3..]);
    }

    #[test]
    fn test_winter_offset() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 3, 30, 0).unwrap();
        let mut pass = PassRecord::open("RS-44", start, true);
        pass.mark_peak(start + Duration::seconds(300), 7.25, true);
        pass.close(start + Duration::seconds(612), true);

        let row = pass.to_tab(New_York).unwrap();
        assert!(row.starts_with("2024 Jan 14 22:30:00\t"));
        assert!(row.ends_with("\tRS-44\t7.25°\t10 Minutes 12 Seconds\t"));
    }
}
