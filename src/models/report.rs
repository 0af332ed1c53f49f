// Aggregated run results: window bounds, counts, first change, latency, trigger timing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::SampleRecord;

/// Time range during which samples are aggregated. Fixed once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ObservationWindow {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        let span = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let end = start.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }
}

/// The earliest sample whose value differed from the baseline. Written once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstChange {
    pub at: DateTime<Utc>,
    pub value: String,
    pub worker_id: usize,
}

/// Nearest-rank latency percentiles over every recorded sample, congestion rejections included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub max: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: u64,
    pub success: u64,
    pub errors: u64,
    pub first_change: Option<FirstChange>,
    pub latency: LatencySummary,
}

impl AggregateStats {
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.errors as f64 / self.total as f64
        }
    }
}

/// Interim per-tick snapshot; counters cover only the samples since the previous tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub at: DateTime<Utc>,
    pub samples: u64,
    pub success: u64,
    pub errors: u64,
    pub last_value: String,
    pub changed_seen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResult {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub error: Option<String>,
}

impl TriggerResult {
    pub fn elapsed(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub baseline: String,
    pub window: ObservationWindow,
    /// None when the trigger had not finished by the time the window closed.
    pub trigger: Option<TriggerResult>,
    pub stats: AggregateStats,
    pub windows: Vec<WindowSnapshot>,
    #[serde(skip)]
    pub samples: Vec<SampleRecord>,
}

impl Report {
    /// First change minus trigger start; None unless both are known.
    pub fn change_latency(&self) -> Option<chrono::Duration> {
        let trigger = self.trigger.as_ref()?;
        let change = self.stats.first_change.as_ref()?;
        Some(change.at - trigger.start)
    }
}
