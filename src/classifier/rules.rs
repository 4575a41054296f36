//! Deterministic band classifier - the ground-truth labeling function

use crate::config::VoltageBands;
use crate::types::{QualityClass, Reading};

/// Classify a reading against the regulatory voltage bands.
///
/// Pure and total for finite inputs. Precedence matters:
///
/// 1. All three phases below the inactive floor -> `Inactive`. This check
///    runs first so an idle installation is never read as critical
///    under-voltage.
/// 2. Any phase above the critical over-voltage bound or below the critical
///    under-voltage bound -> `Critical`.
/// 3. Any phase above the precarious over-voltage bound or below the
///    precarious under-voltage bound -> `Precarious`.
/// 4. Otherwise `Adequate`.
///
/// All comparisons are strict: a phase sitting exactly on a bound belongs to
/// the milder tier.
pub fn classify(reading: &Reading, bands: &VoltageBands) -> QualityClass {
    let voltages = reading.phase_voltages();

    if voltages.iter().all(|&v| v < bands.inactive_floor_v) {
        return QualityClass::Inactive;
    }

    if voltages
        .iter()
        .any(|&v| v > bands.over_voltage_critical_v || v < bands.under_voltage_critical_v)
    {
        return QualityClass::Critical;
    }

    if voltages
        .iter()
        .any(|&v| v > bands.over_voltage_precarious_v || v < bands.under_voltage_precarious_v)
    {
        return QualityClass::Precarious;
    }

    QualityClass::Adequate
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading_with_voltages(v1: f64, v2: f64, v3: f64) -> Reading {
        Reading {
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .expect("valid timestamp"),
            active_power_kw: 50.0,
            reactive_power_kvar: None,
            voltage_l1: v1,
            voltage_l2: v2,
            voltage_l3: v3,
            current_l1: 70.0,
            current_l2: 71.0,
            current_l3: 69.0,
            power_factor: None,
            load_factor: None,
        }
    }

    fn classify_default(v1: f64, v2: f64, v3: f64) -> QualityClass {
        classify(&reading_with_voltages(v1, v2, v3), &VoltageBands::default())
    }

    #[test]
    fn test_all_phases_dead_is_inactive() {
        assert_eq!(classify_default(0.0, 0.0, 0.0), QualityClass::Inactive);
        assert_eq!(classify_default(4.9, 4.9, 4.9), QualityClass::Inactive);
    }

    #[test]
    fn test_inactive_wins_over_critical_under_voltage() {
        // All-zero voltages sit far below the critical under-voltage bound;
        // the inactive sentinel must still win.
        let reading = reading_with_voltages(0.0, 0.0, 0.0);
        assert_eq!(
            classify(&reading, &VoltageBands::default()),
            QualityClass::Inactive
        );
    }

    #[test]
    fn test_single_live_phase_is_not_inactive() {
        // One phase at nominal keeps the reading out of Inactive; the dead
        // phases then trip critical under-voltage.
        assert_eq!(classify_default(220.0, 0.0, 0.0), QualityClass::Critical);
    }

    #[test]
    fn test_adequate_band() {
        assert_eq!(classify_default(220.0, 220.0, 220.0), QualityClass::Adequate);
        assert_eq!(classify_default(202.0, 231.0, 215.0), QualityClass::Adequate);
    }

    #[test]
    fn test_over_voltage_tiers() {
        assert_eq!(classify_default(231.5, 220.0, 220.0), QualityClass::Precarious);
        assert_eq!(classify_default(234.0, 220.0, 220.0), QualityClass::Critical);
    }

    #[test]
    fn test_under_voltage_tiers() {
        assert_eq!(classify_default(201.0, 220.0, 220.0), QualityClass::Precarious);
        assert_eq!(classify_default(190.0, 220.0, 220.0), QualityClass::Critical);
    }

    #[test]
    fn test_bounds_are_strict() {
        // Exactly 233 V is precarious (via > 231), not critical
        assert_eq!(classify_default(233.0, 220.0, 220.0), QualityClass::Precarious);
        assert_eq!(classify_default(233.01, 220.0, 220.0), QualityClass::Critical);
        // Exactly 191 V is precarious (via < 202), not critical
        assert_eq!(classify_default(191.0, 220.0, 220.0), QualityClass::Precarious);
        assert_eq!(classify_default(190.99, 220.0, 220.0), QualityClass::Critical);
        // Exactly 231 V and 202 V are adequate
        assert_eq!(classify_default(231.0, 202.0, 220.0), QualityClass::Adequate);
    }

    #[test]
    fn test_worst_phase_dominates() {
        // One precarious phase plus one critical phase -> Critical
        assert_eq!(classify_default(232.0, 189.0, 220.0), QualityClass::Critical);
    }

    #[test]
    fn test_classification_ignores_power_fields() {
        let mut reading = reading_with_voltages(0.0, 0.0, 0.0);
        reading.active_power_kw = 900.0;
        reading.current_l1 = 400.0;
        assert_eq!(
            classify(&reading, &VoltageBands::default()),
            QualityClass::Inactive
        );
    }
}
