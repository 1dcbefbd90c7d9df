use chrono::{DateTime, Utc};
use serde::Serialize;

/// Half-open interval `[start, end)` covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UsageWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Generations counted in a usage window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyUsage {
    pub used: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl MonthlyUsage {
    /// The same usage with one more generation, for callers that just created one.
    pub fn incremented(self) -> Self {
        Self {
            used: self.used + 1,
            ..self
        }
    }
}
