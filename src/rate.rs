// Sampling cadence: one shared ticker for a target aggregate rate, or a private
// fixed interval per worker when no rate is configured.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};

/// Shared cadence source. Each tick admits exactly one waiting worker, so adding workers
/// raises parallel readiness but not the aggregate attempt rate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    ticker: Arc<Mutex<Interval>>,
    period: Duration,
}

impl RateLimiter {
    /// `per_second` must be > 0.
    pub fn new(per_second: u32) -> Self {
        // Rates above 1e9/s would round the period down to zero.
        let period =
            (Duration::from_secs(1) / per_second.max(1)).max(Duration::from_nanos(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            ticker: Arc::new(Mutex::new(ticker)),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next shared tick. Waiters are served in FIFO order.
    pub async fn tick(&self) {
        self.ticker.lock().await.tick().await;
    }
}

/// Per-worker view of the cadence.
#[derive(Debug)]
pub enum Cadence {
    Shared(RateLimiter),
    PerWorker(Interval),
}

impl Cadence {
    pub fn per_worker(every: Duration) -> Self {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Cadence::PerWorker(ticker)
    }

    pub async fn tick(&mut self) {
        match self {
            Cadence::Shared(limiter) => limiter.tick().await,
            Cadence::PerWorker(ticker) => {
                ticker.tick().await;
            }
        }
    }
}

/// Builds one cadence per worker: shared when `target_rps > 0`, otherwise per-worker.
#[derive(Debug, Clone)]
pub enum CadencePlan {
    Shared(RateLimiter),
    PerWorker(Duration),
}

impl CadencePlan {
    pub fn new(target_rps: u32, sample_interval: Duration) -> Self {
        if target_rps > 0 {
            CadencePlan::Shared(RateLimiter::new(target_rps))
        } else {
            CadencePlan::PerWorker(sample_interval)
        }
    }

    pub fn cadence(&self) -> Cadence {
        match self {
            CadencePlan::Shared(limiter) => Cadence::Shared(limiter.clone()),
            CadencePlan::PerWorker(every) => Cadence::per_worker(*every),
        }
    }
}
