// Orchestrator: wires cadence, gate, workers, bus, aggregator and trigger for one run,
// then assembles the report. Always returns a report; failures only degrade the statistics.

use crate::aggregator::{self, Aggregator};
use crate::baseline::BaselineCell;
use crate::config::ProbeConfig;
use crate::gate::CongestionGate;
use crate::models::{ObservationWindow, Report, TriggerResult};
use crate::rate::CadencePlan;
use crate::source::DataSource;
use crate::trigger::{self, TriggerAction};
use crate::worker::{self, WorkerConfig, WorkerDeps};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long a cancelled trigger may take to wind down before it is aborted.
pub const TRIGGER_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub workers: usize,
    /// 0 = per-worker cadence of `sample_interval`.
    pub target_rps: u32,
    pub sample_interval: Duration,
    pub query_timeout: Duration,
    /// 0 = unlimited.
    pub max_congestion: usize,
    pub window: Duration,
    pub warmup: Duration,
    pub baseline: Option<String>,
}

impl From<&ProbeConfig> for HarnessConfig {
    fn from(p: &ProbeConfig) -> Self {
        Self {
            workers: p.workers,
            target_rps: p.target_rps,
            sample_interval: Duration::from_millis(p.sample_interval_ms),
            query_timeout: Duration::from_millis(p.query_timeout_ms),
            max_congestion: p.max_congestion,
            window: Duration::from_secs(p.window_secs),
            warmup: Duration::from_secs(p.warmup_secs),
            baseline: p.baseline.clone(),
        }
    }
}

/// Runs one observation window. `cancel` ends the run early; the report then covers what
/// was aggregated so far.
pub async fn run<S: DataSource, A: TriggerAction>(
    source: Arc<S>,
    action: A,
    config: HarnessConfig,
    cancel: CancellationToken,
) -> Report {
    let run_cancel = cancel.child_token();
    let started = Instant::now();
    let window = ObservationWindow::new(Utc::now(), config.window);
    let baseline = Arc::new(BaselineCell::with_value(config.baseline.clone()));

    info!(
        workers = config.workers,
        target_rps = config.target_rps,
        max_congestion = config.max_congestion,
        window_secs = config.window.as_secs_f64(),
        warmup_secs = config.warmup.as_secs_f64(),
        "starting probe"
    );

    let (mut trigger_handle, trigger_rx) = trigger::schedule(action, config.warmup, run_cancel.clone());

    let (tx, rx) = mpsc::channel(worker::bus_capacity(config.workers));
    let mut workers = worker::spawn_pool(
        WorkerDeps {
            source,
            gate: CongestionGate::new(config.max_congestion),
            baseline: baseline.clone(),
            tx,
            cancel: run_cancel.clone(),
        },
        WorkerConfig {
            workers: config.workers,
            cadence: CadencePlan::new(config.target_rps, config.sample_interval),
            query_timeout: config.query_timeout,
        },
    );

    let outcome = aggregator::run(
        Aggregator::new(baseline.clone()),
        rx,
        started + config.window,
        run_cancel.clone(),
    )
    .await;

    let trigger = drain_trigger(trigger_rx);

    run_cancel.cancel();
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "poll worker panicked");
        }
    }
    match tokio::time::timeout(TRIGGER_GRACE, &mut trigger_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "trigger task panicked"),
        Err(_) => {
            warn!(
                grace_ms = TRIGGER_GRACE.as_millis() as u64,
                "trigger ignored cancellation; aborting it"
            );
            trigger_handle.abort();
        }
    }
    debug!("probe tasks stopped");

    Report {
        baseline: baseline.get().to_string(),
        window,
        trigger,
        stats: outcome.stats,
        windows: outcome.windows,
        samples: outcome.samples,
    }
}

/// Non-blocking: a trigger still running when the window closes loses its result.
// TODO: confirm with the product owner whether slow triggers should extend the run instead.
fn drain_trigger(mut rx: oneshot::Receiver<TriggerResult>) -> Option<TriggerResult> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(oneshot::error::TryRecvError::Empty) => {
            warn!("trigger still running at window end; its timing is dropped");
            None
        }
        Err(oneshot::error::TryRecvError::Closed) => {
            debug!("trigger never fired");
            None
        }
    }
}
