//! Diagnostic text generation for classified anomalies
//!
//! Turns a (reading, predicted class) pair into per-phase findings plus a
//! deduplicated set of probable causes and recommended actions. Output is
//! fully deterministic: phases are walked in L1, L2, L3 order and the
//! cause/action set is emitted in lexicographic order, so the same reading
//! always renders the same text.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::VoltageBands;
use crate::types::{QualityClass, Reading};

/// Fixed message for readings with no risk class
pub const NORMAL_OPERATION_MSG: &str =
    "Operation within normal parameters. No action needed.";

/// Fallback when a risk class arrives with no phase over a band bound
/// (classifier/rule disagreement). Never an empty string.
pub const GENERAL_INSPECTION_MSG: &str =
    "Anomaly detected. Perform a general inspection of the installation.";

const CAUSE_OVER_CRITICAL: &str =
    "Probable cause: fluctuations on the utility grid or a faulty transformer tap.";
const ACTION_OVER_CRITICAL: &str =
    "Recommended action: Contact the utility immediately. Inspect the transformer.";

const CAUSE_OVER_PRECARIOUS: &str =
    "Probable cause: momentary variations on the utility grid.";
const ACTION_OVER_PRECARIOUS: &str =
    "Recommended action: Monitor voltage stability over the next hours.";

const CAUSE_UNDER_CRITICAL: &str =
    "Probable cause: circuit overload, undersized wiring, or a severe inverter fault.";
const ACTION_UNDER_CRITICAL: &str =
    "Recommended action: Shed non-essential loads. Inspect breakers and wiring. Check inverter error logs.";

const CAUSE_UNDER_PRECARIOUS: &str =
    "Probable cause: loose or oxidized connections, or voltage drop along cables.";
const ACTION_UNDER_PRECARIOUS: &str =
    "Recommended action: Inspect and retighten the electrical connections.";

/// Structured diagnosis for one classified reading
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// The class this diagnosis was generated for
    pub class: QualityClass,
    /// Per-phase findings, in L1, L2, L3 order
    pub findings: Vec<String>,
    /// Deduplicated causes and actions, lexicographically sorted
    pub actions: Vec<String>,
}

impl Diagnosis {
    /// Render the human-readable diagnostic text.
    ///
    /// Findings one per line, then a blank line, then the sorted
    /// cause/action set. No-risk classes render the fixed normal-operation
    /// message; a risk class without findings renders the general-inspection
    /// fallback.
    pub fn render(&self) -> String {
        if !self.class.is_risk() {
            return NORMAL_OPERATION_MSG.to_string();
        }
        if self.findings.is_empty() {
            return GENERAL_INSPECTION_MSG.to_string();
        }
        let mut text = self.findings.join("\n");
        if !self.actions.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.actions.join("\n"));
        }
        text
    }
}

/// Generate the diagnosis for a classified reading.
///
/// Each phase is assessed independently against the band table (a reading
/// can have one phase critical and another merely precarious); tier checks
/// are ordered so critical findings shadow the precarious ones on the same
/// phase. Voltages are annotated to one decimal place.
pub fn diagnose(reading: &Reading, class: QualityClass, bands: &VoltageBands) -> Diagnosis {
    if !class.is_risk() {
        return Diagnosis {
            class,
            findings: Vec::new(),
            actions: Vec::new(),
        };
    }

    let mut findings = Vec::new();
    let mut advice: BTreeSet<&'static str> = BTreeSet::new();

    for (phase, voltage) in reading.labeled_phase_voltages() {
        if voltage > bands.over_voltage_critical_v {
            findings.push(format!(
                "Phase {phase} critical over-voltage ({voltage:.1} V)."
            ));
            advice.insert(CAUSE_OVER_CRITICAL);
            advice.insert(ACTION_OVER_CRITICAL);
        } else if voltage > bands.over_voltage_precarious_v {
            findings.push(format!(
                "Phase {phase} precarious over-voltage ({voltage:.1} V)."
            ));
            advice.insert(CAUSE_OVER_PRECARIOUS);
            advice.insert(ACTION_OVER_PRECARIOUS);
        } else if voltage < bands.under_voltage_critical_v {
            findings.push(format!(
                "Phase {phase} critical under-voltage ({voltage:.1} V)."
            ));
            advice.insert(CAUSE_UNDER_CRITICAL);
            advice.insert(ACTION_UNDER_CRITICAL);
        } else if voltage < bands.under_voltage_precarious_v {
            findings.push(format!(
                "Phase {phase} precarious under-voltage ({voltage:.1} V)."
            ));
            advice.insert(CAUSE_UNDER_PRECARIOUS);
            advice.insert(ACTION_UNDER_PRECARIOUS);
        }
    }

    Diagnosis {
        class,
        findings,
        actions: advice.into_iter().map(String::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading_with_voltages(v1: f64, v2: f64, v3: f64) -> Reading {
        Reading {
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 1)
                .and_then(|d| d.and_hms_opt(14, 15, 0))
                .expect("valid timestamp"),
            active_power_kw: 80.0,
            reactive_power_kvar: None,
            voltage_l1: v1,
            voltage_l2: v2,
            voltage_l3: v3,
            current_l1: 100.0,
            current_l2: 101.0,
            current_l3: 99.0,
            power_factor: None,
            load_factor: None,
        }
    }

    #[test]
    fn test_no_risk_classes_render_fixed_message() {
        let bands = VoltageBands::default();
        // Even with an out-of-band voltage, a no-risk class means no action
        let reading = reading_with_voltages(236.0, 220.0, 220.0);
        for class in [QualityClass::Adequate, QualityClass::Inactive] {
            let diagnosis = diagnose(&reading, class, &bands);
            assert_eq!(diagnosis.render(), NORMAL_OPERATION_MSG);
            assert!(diagnosis.findings.is_empty());
        }
    }

    #[test]
    fn test_critical_over_voltage_finding_and_action() {
        let bands = VoltageBands::default();
        let reading = reading_with_voltages(234.0, 220.0, 220.0);
        let diagnosis = diagnose(&reading, QualityClass::Critical, &bands);
        let text = diagnosis.render();
        assert!(text.contains("Phase L1 critical over-voltage (234.0 V)"), "{text}");
        assert!(text.contains("Contact the utility immediately"), "{text}");
        assert!(!text.contains("Phase L2"), "{text}");
    }

    #[test]
    fn test_precarious_over_voltage_action() {
        let bands = VoltageBands::default();
        let reading = reading_with_voltages(232.0, 220.0, 220.0);
        let diagnosis = diagnose(&reading, QualityClass::Precarious, &bands);
        let text = diagnosis.render();
        assert!(text.contains("Phase L1 precarious over-voltage (232.0 V)"), "{text}");
        assert!(text.contains("Monitor voltage stability"), "{text}");
    }

    #[test]
    fn test_under_voltage_tiers() {
        let bands = VoltageBands::default();
        let critical = diagnose(
            &reading_with_voltages(185.0, 220.0, 220.0),
            QualityClass::Critical,
            &bands,
        );
        assert!(critical.render().contains("critical under-voltage (185.0 V)"));
        assert!(critical.render().contains("Shed non-essential loads"));

        let precarious = diagnose(
            &reading_with_voltages(198.0, 220.0, 220.0),
            QualityClass::Precarious,
            &bands,
        );
        assert!(precarious.render().contains("precarious under-voltage (198.0 V)"));
        assert!(precarious.render().contains("retighten the electrical connections"));
    }

    #[test]
    fn test_mixed_phases_keep_l1_l2_l3_order() {
        let bands = VoltageBands::default();
        let reading = reading_with_voltages(234.0, 232.0, 198.0);
        let diagnosis = diagnose(&reading, QualityClass::Critical, &bands);
        assert_eq!(diagnosis.findings.len(), 3);
        assert!(diagnosis.findings[0].contains("Phase L1 critical over-voltage"));
        assert!(diagnosis.findings[1].contains("Phase L2 precarious over-voltage"));
        assert!(diagnosis.findings[2].contains("Phase L3 precarious under-voltage"));
    }

    #[test]
    fn test_actions_deduplicate_across_phases() {
        let bands = VoltageBands::default();
        // All three phases trip the same critical over-voltage tier
        let reading = reading_with_voltages(235.0, 236.0, 237.0);
        let diagnosis = diagnose(&reading, QualityClass::Critical, &bands);
        assert_eq!(diagnosis.findings.len(), 3);
        // One cause plus one action, not three of each
        assert_eq!(diagnosis.actions.len(), 2);
    }

    #[test]
    fn test_actions_are_sorted_and_output_is_idempotent() {
        let bands = VoltageBands::default();
        let reading = reading_with_voltages(234.0, 185.0, 198.0);
        let first = diagnose(&reading, QualityClass::Critical, &bands);
        let second = diagnose(&reading, QualityClass::Critical, &bands);
        assert_eq!(first.render(), second.render());

        let mut sorted = first.actions.clone();
        sorted.sort();
        assert_eq!(first.actions, sorted, "actions must emit pre-sorted");
    }

    #[test]
    fn test_disagreement_falls_back_to_general_inspection() {
        let bands = VoltageBands::default();
        // Classifier said Precarious but every phase is in the adequate band
        let reading = reading_with_voltages(220.0, 220.0, 220.0);
        let diagnosis = diagnose(&reading, QualityClass::Precarious, &bands);
        let text = diagnosis.render();
        assert_eq!(text, GENERAL_INSPECTION_MSG);
        assert!(!text.is_empty());
    }

    #[test]
    fn test_voltage_formatted_to_one_decimal() {
        let bands = VoltageBands::default();
        let reading = reading_with_voltages(233.456, 220.0, 220.0);
        let diagnosis = diagnose(&reading, QualityClass::Critical, &bands);
        assert!(
            diagnosis.findings[0].contains("(233.5 V)"),
            "{:?}",
            diagnosis.findings
        );
    }
}
