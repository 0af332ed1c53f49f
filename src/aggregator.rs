// Single consumer of the sample bus. Owns every counter, and is the only writer of the
// baseline and the first-change record. Runs until the window deadline (or cancellation).

use crate::baseline::BaselineCell;
use crate::models::{AggregateStats, FirstChange, Sample, SampleRecord, WindowSnapshot};
use crate::stats;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Interim snapshot cadence.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct WindowCounters {
    samples: u64,
    success: u64,
    errors: u64,
}

/// What the aggregator hands back when the window closes.
#[derive(Debug)]
pub struct AggregateOutcome {
    pub stats: AggregateStats,
    pub windows: Vec<WindowSnapshot>,
    pub samples: Vec<SampleRecord>,
}

#[derive(Debug)]
pub struct Aggregator {
    baseline: Arc<BaselineCell>,
    total: u64,
    success: u64,
    errors: u64,
    first_change: Option<FirstChange>,
    durations: Vec<Duration>,
    window: WindowCounters,
    last_value: String,
    windows: Vec<WindowSnapshot>,
    samples: Vec<SampleRecord>,
}

impl Aggregator {
    pub fn new(baseline: Arc<BaselineCell>) -> Self {
        Self {
            baseline,
            total: 0,
            success: 0,
            errors: 0,
            first_change: None,
            durations: Vec::new(),
            window: WindowCounters::default(),
            last_value: String::new(),
            windows: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn baseline(&self) -> &str {
        self.baseline.get()
    }

    pub fn first_change(&self) -> Option<&FirstChange> {
        self.first_change.as_ref()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Folds one sample into cumulative and window-local counters.
    pub fn record(&mut self, sample: Sample) {
        self.total += 1;
        self.window.samples += 1;
        if sample.is_error() {
            self.errors += 1;
            self.window.errors += 1;
        } else {
            self.success += 1;
            self.window.success += 1;
        }
        self.durations.push(sample.duration);
        self.samples.push(sample.record());

        if sample.value.is_empty() {
            return;
        }
        // The sample that establishes the baseline cannot also be a change against it.
        let had_baseline = self.baseline.is_set();
        if self.baseline.set_if_unset(&sample.value) {
            info!(baseline = %sample.value, "baseline established");
        }
        if sample.changed && had_baseline && self.first_change.is_none() {
            info!(
                value = %sample.value,
                at = %sample.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
                worker_id = sample.worker_id,
                "first change observed"
            );
            self.first_change = Some(FirstChange {
                at: sample.timestamp,
                value: sample.value.clone(),
                worker_id: sample.worker_id,
            });
        }
        self.last_value = sample.value;
    }

    /// Closes the current reporting window. Cumulative totals are untouched.
    pub fn snapshot_window(&mut self) -> WindowSnapshot {
        let window = std::mem::take(&mut self.window);
        let snapshot = WindowSnapshot {
            at: Utc::now(),
            samples: window.samples,
            success: window.success,
            errors: window.errors,
            last_value: self.last_value.clone(),
            changed_seen: self.first_change.is_some(),
        };
        self.windows.push(snapshot.clone());
        snapshot
    }

    pub fn finish(self) -> AggregateOutcome {
        AggregateOutcome {
            stats: AggregateStats {
                total: self.total,
                success: self.success,
                errors: self.errors,
                first_change: self.first_change,
                latency: stats::summarize(&self.durations),
            },
            windows: self.windows,
            samples: self.samples,
        }
    }
}

/// Consumes samples until `deadline`, emitting an interim snapshot every REPORT_INTERVAL.
/// Samples still queued when the deadline fires are not consumed.
#[instrument(skip_all, name = "aggregator")]
pub async fn run(
    mut aggregator: Aggregator,
    mut rx: mpsc::Receiver<Sample>,
    deadline: Instant,
    cancel: CancellationToken,
) -> AggregateOutcome {
    let mut report_tick = interval_at(Instant::now() + REPORT_INTERVAL, REPORT_INTERVAL);
    report_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let window_end = sleep_until(deadline);
    tokio::pin!(window_end);
    let mut bus_open = true;

    loop {
        tokio::select! {
            biased;
            _ = &mut window_end => {
                debug!("observation window closed");
                break;
            }
            _ = cancel.cancelled() => {
                info!("aggregation cancelled before window end");
                break;
            }
            _ = report_tick.tick() => {
                let w = aggregator.snapshot_window();
                info!(
                    samples = w.samples,
                    success = w.success,
                    errors = w.errors,
                    last_value = %w.last_value,
                    changed = w.changed_seen,
                    "window"
                );
            }
            sample = rx.recv(), if bus_open => {
                match sample {
                    Some(sample) => aggregator.record(sample),
                    None => {
                        debug!("sample bus closed; waiting for window end");
                        bus_open = false;
                    }
                }
            }
        }
    }
    aggregator.finish()
}
