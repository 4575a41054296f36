//! Voltage quality classification: regulatory bands and the four-tier class enum

use serde::{Deserialize, Serialize};

/// Regulatory voltage tolerance bands for a 220 V three-phase service.
///
/// The three tiers (adequate / precarious / critical) follow the steady-state
/// voltage tables of the grid regulator; the inactive floor is a sentinel for
/// an idle installation, not a regulatory band.
pub mod voltage_bands {
    /// All three phases below this mean the installation is idle (V)
    pub const INACTIVE_FLOOR: f64 = 5.0;
    /// Under-voltage below this is critical (V)
    pub const UNDER_VOLTAGE_CRITICAL: f64 = 191.0;
    /// Under-voltage below this (but at or above critical) is precarious (V)
    pub const UNDER_VOLTAGE_PRECARIOUS: f64 = 202.0;
    /// Over-voltage above this (but at or below critical) is precarious (V)
    pub const OVER_VOLTAGE_PRECARIOUS: f64 = 231.0;
    /// Over-voltage above this is critical (V)
    pub const OVER_VOLTAGE_CRITICAL: f64 = 233.0;
}

/// Four-tier voltage quality classification.
///
/// Ordered by severity: `Inactive` and `Adequate` carry no risk,
/// `Precarious` and `Critical` do. The derived `Ord` follows that order so
/// reports can rank and tie-break by severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityClass {
    Inactive = 0,
    Adequate = 1,
    Precarious = 2,
    Critical = 3,
}

/// Number of quality classes (size of vote/count arrays)
pub const CLASS_COUNT: usize = 4;

impl QualityClass {
    /// All classes in ascending severity order
    pub const ALL: [Self; CLASS_COUNT] = [
        Self::Inactive,
        Self::Adequate,
        Self::Precarious,
        Self::Critical,
    ];

    /// Whether this class belongs in a risk report
    pub fn is_risk(self) -> bool {
        matches!(self, Self::Precarious | Self::Critical)
    }

    /// Index into severity-ordered count arrays
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`QualityClass::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for QualityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Adequate => write!(f, "ADEQUATE"),
            Self::Precarious => write!(f, "PRECARIOUS"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
