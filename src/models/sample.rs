// One observation of the monitored value, as emitted by a poll worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::source::SourceError;

/// Why a sample counts as an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// Synthetic: the congestion gate was full, no query was attempted.
    #[error("congestion exceeded: {in_flight} samples in flight (cap {cap})")]
    CongestionExceeded { in_flight: usize, cap: usize },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Immutable once sent on the sample bus.
#[derive(Debug, Clone)]
pub struct Sample {
    /// When the attempt started (after the cadence tick).
    pub timestamp: DateTime<Utc>,
    pub worker_id: usize,
    /// Observed value; empty when the table was empty or no row resolved.
    pub value: String,
    pub error: Option<SampleError>,
    pub changed: bool,
    /// Time spent in the data source for this attempt (~0 when rejected by the gate).
    pub duration: Duration,
    /// Samples in flight when this one was admitted (or the level that caused rejection).
    pub congestion: usize,
}

impl Sample {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn record(&self) -> SampleRecord {
        SampleRecord {
            timestamp: self.timestamp,
            worker_id: self.worker_id,
            value: self.value.clone(),
            changed: self.changed,
            errored: self.is_error(),
        }
    }
}

/// Persisted form of a sample. Errors are not a CSV column; `errored` only feeds the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub timestamp: DateTime<Utc>,
    pub worker_id: usize,
    pub value: String,
    pub changed: bool,
    #[serde(default, skip_serializing)]
    pub errored: bool,
}
