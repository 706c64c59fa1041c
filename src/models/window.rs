// Requested time range for a chart query

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// `(start, end]`: rows match `time > start AND time <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `duration_secs` ending at `end` (default: now). Sub-second precision is dropped.
    pub fn ending_at(duration_secs: u64, end: Option<DateTime<Utc>>) -> anyhow::Result<Self> {
        anyhow::ensure!(duration_secs > 0, "duration must be > 0 seconds");
        let span = i64::try_from(duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| anyhow::anyhow!("duration out of range: {}", duration_secs))?;
        let end = end.unwrap_or_else(Utc::now);
        let end = DateTime::from_timestamp(end.timestamp(), 0)
            .ok_or_else(|| anyhow::anyhow!("end instant out of range"))?;
        let start = end
            .checked_sub_signed(span)
            .ok_or_else(|| anyhow::anyhow!("duration out of range: {}", duration_secs))?;
        Ok(Self { start, end })
    }

    /// Window from explicit epoch-second bounds.
    pub fn from_epoch_secs(start: i64, end: i64) -> anyhow::Result<Self> {
        anyhow::ensure!(start < end, "window start {} must precede end {}", start, end);
        let start = DateTime::from_timestamp(start, 0)
            .ok_or_else(|| anyhow::anyhow!("start out of range: {}", start))?;
        let end = DateTime::from_timestamp(end, 0)
            .ok_or_else(|| anyhow::anyhow!("end out of range: {}", end))?;
        Ok(Self { start, end })
    }

    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn contains_ms(&self, ts_ms: i64) -> bool {
        ts_ms > self.start_ms() && ts_ms <= self.end_ms()
    }
}
