// Poll workers: each waits on its cadence, takes a congestion lease, samples one random row
// and pushes the Sample onto the bus. Errors become samples; nothing here is fatal.

use crate::baseline::BaselineCell;
use crate::gate::CongestionGate;
use crate::models::{Sample, SampleError};
use crate::rate::{Cadence, CadencePlan};
use crate::source::{DataSource, SourceError};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Random-row lookups per attempt before settling for an empty value.
pub const ROW_LOOKUP_ATTEMPTS: usize = 3;

/// Sample bus capacity: room for bursts without blocking producers under normal load.
pub fn bus_capacity(workers: usize) -> usize {
    (workers * 4).max(1)
}

/// Shared handles every worker of a run needs.
pub struct WorkerDeps<S> {
    pub source: Arc<S>,
    pub gate: CongestionGate,
    pub baseline: Arc<BaselineCell>,
    pub tx: mpsc::Sender<Sample>,
    pub cancel: CancellationToken,
}

impl<S> Clone for WorkerDeps<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            gate: self.gate.clone(),
            baseline: self.baseline.clone(),
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

pub struct WorkerConfig {
    pub workers: usize,
    pub cadence: CadencePlan,
    pub query_timeout: Duration,
}

/// Spawns `config.workers` poll workers. They exit once `deps.cancel` fires or the bus closes.
pub fn spawn_pool<S: DataSource>(deps: WorkerDeps<S>, config: WorkerConfig) -> JoinSet<()> {
    let mut set = JoinSet::new();
    for worker_id in 0..config.workers {
        let deps = deps.clone();
        let cadence = config.cadence.cadence();
        let span = tracing::debug_span!("worker", worker_id);
        set.spawn(run(worker_id, deps, cadence, config.query_timeout).instrument(span));
    }
    set
}

async fn run<S: DataSource>(
    worker_id: usize,
    deps: WorkerDeps<S>,
    mut cadence: Cadence,
    query_timeout: Duration,
) {
    let WorkerDeps {
        source,
        gate,
        baseline,
        tx,
        cancel,
    } = deps;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = cadence.tick() => {}
        }

        // In-flight queries are not interrupted; they are bounded by query_timeout.
        let sample = sample_once(worker_id, source.as_ref(), &gate, &baseline, query_timeout).await;
        if let Some(e) = &sample.error {
            tracing::debug!(error = %e, operation = "sample", "sample failed");
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(sample) => {
                if sent.is_err() {
                    tracing::debug!("sample bus closed");
                    break;
                }
            }
        }
    }
    tracing::debug!("worker shutting down");
}

/// One sampling attempt. The lease is held for the whole attempt and released on return.
pub async fn sample_once<S: DataSource>(
    worker_id: usize,
    source: &S,
    gate: &CongestionGate,
    baseline: &BaselineCell,
    query_timeout: Duration,
) -> Sample {
    let timestamp = Utc::now();
    let started = Instant::now();

    let lease = match gate.try_enter() {
        Ok(lease) => lease,
        Err(full) => {
            return Sample {
                timestamp,
                worker_id,
                value: String::new(),
                error: Some(SampleError::CongestionExceeded {
                    in_flight: full.in_flight,
                    cap: full.cap,
                }),
                changed: false,
                duration: started.elapsed(),
                congestion: full.in_flight,
            };
        }
    };
    let congestion = lease.level();

    let outcome = read_random_row(source, query_timeout).await;
    drop(lease);
    let duration = started.elapsed();

    let (value, error) = match outcome {
        Ok(value) => (value, None),
        Err(e) => (String::new(), Some(SampleError::Source(e))),
    };
    let changed = baseline.differs(&value);

    Sample {
        timestamp,
        worker_id,
        value,
        error,
        changed,
        duration,
        congestion,
    }
}

/// Max id, then up to ROW_LOOKUP_ATTEMPTS uniformly random ids in [1, max]. Gaps in the id
/// space are retried rather than biasing toward low ids. Empty table or no resolvable row is an
/// empty value, not an error; the last error is returned only if no lookup succeeded at all.
async fn read_random_row<S: DataSource>(
    source: &S,
    query_timeout: Duration,
) -> Result<String, SourceError> {
    let max_id = source.fetch_max_id(query_timeout).await?;
    if max_id <= 0 {
        return Ok(String::new());
    }

    let mut last_err = None;
    let mut any_ok = false;
    for _ in 0..ROW_LOOKUP_ATTEMPTS {
        let id = rand::rng().random_range(1..=max_id);
        match source.fetch_value_by_id(id, query_timeout).await {
            Ok(value) if !value.is_empty() => return Ok(value),
            Ok(_) => any_ok = true,
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) if !any_ok => Err(e),
        _ => Ok(String::new()),
    }
}
