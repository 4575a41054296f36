//! Normalized measurement record from the plant metering system

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One periodic measurement sample from the installation.
///
/// Timestamps are expected to be strictly increasing in the source stream;
/// the engine does not re-sort (peak tie-breaks and aggregates assume
/// chronological input). Numeric coercion of unparseable source fields to
/// zero is the ingestion layer's responsibility - every field here is
/// already a finite number or an explicit `None`.
///
/// Single-phase meters are represented with the same voltage on all three
/// phases (L1 = L2 = L3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Measurement instant (plant-local time)
    pub timestamp: NaiveDateTime,
    /// Active power demand (kW)
    pub active_power_kw: f64,
    /// Reactive power (kVAr) - not present in all meter firmware revisions
    #[serde(default)]
    pub reactive_power_kvar: Option<f64>,
    /// Phase L1 voltage (V)
    pub voltage_l1: f64,
    /// Phase L2 voltage (V)
    pub voltage_l2: f64,
    /// Phase L3 voltage (V)
    pub voltage_l3: f64,
    /// Phase L1 current (A)
    pub current_l1: f64,
    /// Phase L2 current (A)
    pub current_l2: f64,
    /// Phase L3 current (A)
    pub current_l3: f64,
    /// Power factor, pass-through only
    #[serde(default)]
    pub power_factor: Option<f64>,
    /// Load factor, pass-through only
    #[serde(default)]
    pub load_factor: Option<f64>,
}

impl Reading {
    /// Phase voltages in L1, L2, L3 order
    pub fn phase_voltages(&self) -> [f64; 3] {
        [self.voltage_l1, self.voltage_l2, self.voltage_l3]
    }

    /// Phase voltages paired with their conductor labels, in L1, L2, L3 order
    pub fn labeled_phase_voltages(&self) -> [(&'static str, f64); 3] {
        [
            ("L1", self.voltage_l1),
            ("L2", self.voltage_l2),
            ("L3", self.voltage_l3),
        ]
    }
}
