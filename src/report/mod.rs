//! Daily aggregation and risk reporting
//!
//! Windows one day of readings, computes the energy and peak-demand
//! aggregates over the full day, then classifies and diagnoses the
//! operational-window subset into a risk list. No per-row failure aborts
//! the report: unclassifiable rows are logged, counted, and skipped.

use chrono::{NaiveDate, Timelike};
use tracing::{info, warn};

use crate::classifier::{self, VoltageForest};
use crate::config::{PlantConfig, ReportingConfig};
use crate::diagnosis::diagnose;
use crate::types::{ClassifierMode, DailyReport, PeakDemand, Reading, RiskEntry};

/// Assemble the daily report for `day`.
///
/// - Energy and peak cover every reading of the day.
/// - Classification and diagnosis cover only the operational window
///   (readings outside it stay in the raw payload untouched).
/// - An empty day yields a well-formed report with an explicit error field
///   and zeroed aggregates.
pub fn build_report(
    day: NaiveDate,
    readings: &[Reading],
    model: Option<&VoltageForest>,
    config: &PlantConfig,
) -> DailyReport {
    let classifier_mode = if model.is_some() {
        ClassifierMode::Learned
    } else {
        ClassifierMode::RuleFallback
    };

    let day_readings: Vec<Reading> = readings
        .iter()
        .filter(|reading| reading.timestamp.date() == day)
        .cloned()
        .collect();

    if day_readings.is_empty() {
        info!(%day, "no readings for requested day");
        return DailyReport::empty(day, classifier_mode, format!("no data for {day}"));
    }

    let total_energy_kwh =
        total_energy_kwh(&day_readings, config.reporting.sampling_interval_min);
    let peak = find_peak(&day_readings);

    let bands = &config.voltage_bands;
    let mut risk_entries = Vec::new();
    let mut skipped_rows = 0usize;

    for reading in day_readings
        .iter()
        .filter(|reading| in_operational_window(reading, &config.reporting))
    {
        let class = match classifier::predict_class(reading, model, bands) {
            Ok(class) => class,
            Err(e) => {
                warn!(timestamp = %reading.timestamp, error = %e, "skipping unclassifiable row");
                skipped_rows += 1;
                continue;
            }
        };
        if !class.is_risk() {
            continue;
        }
        let diagnosis = diagnose(reading, class, bands).render();
        risk_entries.push(RiskEntry {
            time_of_day: reading.timestamp.format("%H:%M:%S").to_string(),
            class,
            diagnosis,
            reading: reading.clone(),
        });
    }

    info!(
        %day,
        readings = day_readings.len(),
        risks = risk_entries.len(),
        skipped = skipped_rows,
        mode = %classifier_mode,
        "daily report assembled"
    );

    DailyReport {
        day,
        total_energy_kwh,
        peak,
        readings: day_readings,
        risk_entries,
        classifier_mode,
        skipped_rows,
        error: None,
    }
}

/// Total energy as a left-rectangle integral of demand.
///
/// Assumes uniform, gap-free sampling at the configured interval; gaps in
/// the stream bias the estimate low. Rounded to 2 decimals.
fn total_energy_kwh(day_readings: &[Reading], sampling_interval_min: u32) -> f64 {
    let interval_hours = f64::from(sampling_interval_min) / 60.0;
    let total: f64 = day_readings
        .iter()
        .map(|reading| reading.active_power_kw)
        .sum::<f64>()
        * interval_hours;
    round2(total)
}

/// Maximum-demand reading; ties keep the first occurrence in input order
fn find_peak(day_readings: &[Reading]) -> Option<PeakDemand> {
    let mut best: Option<&Reading> = None;
    for reading in day_readings {
        let replace = match best {
            None => true,
            Some(current) => reading.active_power_kw > current.active_power_kw,
        };
        if replace {
            best = Some(reading);
        }
    }
    best.map(|reading| PeakDemand {
        timestamp: reading.timestamp,
        reading: reading.clone(),
    })
}

/// Hour-of-day window check, inclusive start, exclusive end
fn in_operational_window(reading: &Reading, reporting: &ReportingConfig) -> bool {
    let hour = reading.timestamp.hour();
    hour >= reporting.operational_start_hour && hour < reporting.operational_end_hour
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
