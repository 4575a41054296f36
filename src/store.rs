//! In-memory reading store: one immutable batch of chronological samples

use chrono::NaiveDate;

use crate::types::Reading;

/// Ordered, time-indexed batch of readings.
///
/// Built once per data load and immutable afterwards. The engine publishes a
/// fresh store atomically on reload, so concurrent report requests always
/// observe a complete batch. Input order is preserved as-is: the metering
/// stream is chronological and the engine does not re-sort.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    readings: Vec<Reading>,
}

impl ReadingStore {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The full batch, in source order
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Most recent calendar date present in the batch.
    ///
    /// Used as the default report day when the caller does not name one.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.readings.iter().map(|r| r.timestamp.date()).max()
    }
}
