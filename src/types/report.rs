//! Daily report structures consumed by the API/dashboard layer

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::{QualityClass, Reading};

/// Which classifier produced the predictions in a report.
///
/// `RuleFallback` signals degraded-but-available classification: the learned
/// model was not ready (insufficient training variety or no batch loaded)
/// and the deterministic band rules were used instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassifierMode {
    Learned,
    RuleFallback,
}

impl std::fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Learned => write!(f, "learned"),
            Self::RuleFallback => write!(f, "rule-fallback"),
        }
    }
}

/// The day's maximum-demand sample, with its full field set.
///
/// Ties on active power resolve to the first occurrence in chronological
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct PeakDemand {
    /// Instant of the peak
    pub timestamp: NaiveDateTime,
    /// The complete reading at the peak
    pub reading: Reading,
}

/// One operational reading flagged as Precarious or Critical
#[derive(Debug, Clone, Serialize)]
pub struct RiskEntry {
    /// Time of day, formatted `%H:%M:%S`
    pub time_of_day: String,
    /// Predicted quality class
    pub class: QualityClass,
    /// Rendered diagnostic text (findings plus recommended actions)
    pub diagnosis: String,
    /// The underlying reading
    pub reading: Reading,
}

/// Per-day aggregate report.
///
/// Always well-formed: an empty day or a missing model never aborts report
/// construction. Absence of data is communicated through the `error` field
/// with zeroed aggregates, degraded classification through
/// `classifier_mode`.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    /// The day this report covers
    pub day: NaiveDate,
    /// Total generated energy over the day (kWh), rounded to 2 decimals
    pub total_energy_kwh: f64,
    /// Maximum-demand sample, `None` when the day has no readings
    pub peak: Option<PeakDemand>,
    /// Every reading of the day, including outside the operational window
    pub readings: Vec<Reading>,
    /// Operational-window readings classified Precarious or Critical
    pub risk_entries: Vec<RiskEntry>,
    /// Classifier that produced the risk predictions
    pub classifier_mode: ClassifierMode,
    /// Operational rows excluded because their features were unusable
    pub skipped_rows: usize,
    /// Set when the day had no readings (or no batch was loaded)
    pub error: Option<String>,
}

impl DailyReport {
    /// An all-empty report carrying an explicit error message
    pub fn empty(day: NaiveDate, classifier_mode: ClassifierMode, error: String) -> Self {
        Self {
            day,
            total_energy_kwh: 0.0,
            peak: None,
            readings: Vec::new(),
            risk_entries: Vec::new(),
            classifier_mode,
            skipped_rows: 0,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_shape() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let report = DailyReport::empty(
            day,
            ClassifierMode::RuleFallback,
            format!("no data for {day}"),
        );
        assert_eq!(report.total_energy_kwh, 0.0);
        assert!(report.peak.is_none());
        assert!(report.risk_entries.is_empty());
        assert_eq!(report.error.as_deref(), Some("no data for 2023-01-01"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let report = DailyReport::empty(day, ClassifierMode::Learned, "no data".to_string());
        let json = serde_json::to_value(&report).expect("report serializes");
        assert_eq!(json["day"], "2023-01-01");
        assert_eq!(json["classifier_mode"], "Learned");
        assert_eq!(json["total_energy_kwh"], 0.0);
    }
}
