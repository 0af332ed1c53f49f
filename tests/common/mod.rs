// Shared test helpers: an in-memory DataSource and sample builders

#![allow(dead_code)]

use chrono::Utc;
use lagprobe::models::Sample;
use lagprobe::source::{DataSource, SourceError, with_timeout};
use lagprobe::trigger::{TriggerAction, TriggerError};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Rows are 1-based: id N reads rows[N - 1]. Empty strings model gaps in the id space.
/// The delay applies to the max-id query, under the caller's timeout.
#[derive(Default)]
pub struct ScriptedSource {
    rows: Mutex<Vec<String>>,
    delay_ms: AtomicU64,
    fail_max_id: AtomicBool,
    fail_values: AtomicBool,
    max_id_calls: AtomicUsize,
    value_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn with_rows(rows: &[&str]) -> Self {
        Self {
            rows: Mutex::new(rows.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_all(&self, value: &str) {
        for row in self.rows.lock().unwrap().iter_mut() {
            *row = value.to_string();
        }
    }

    pub fn fail_max_id(&self, fail: bool) {
        self.fail_max_id.store(fail, Ordering::SeqCst);
    }

    pub fn fail_values(&self, fail: bool) {
        self.fail_values.store(fail, Ordering::SeqCst);
    }

    pub fn max_id_calls(&self) -> usize {
        self.max_id_calls.load(Ordering::SeqCst)
    }

    pub fn value_calls(&self) -> usize {
        self.value_calls.load(Ordering::SeqCst)
    }
}

impl DataSource for ScriptedSource {
    async fn fetch_max_id(&self, timeout: Duration) -> Result<i64, SourceError> {
        self.max_id_calls.fetch_add(1, Ordering::SeqCst);
        let delay = Duration::from_millis(self.delay_ms.load(Ordering::SeqCst));
        with_timeout(timeout, async {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.fail_max_id.load(Ordering::SeqCst) {
                return Err(SourceError::Query("injected max_id failure".into()));
            }
            Ok(self.rows.lock().unwrap().len() as i64)
        })
        .await
    }

    async fn fetch_value_by_id(&self, id: i64, timeout: Duration) -> Result<String, SourceError> {
        self.value_calls.fetch_add(1, Ordering::SeqCst);
        with_timeout(timeout, async {
            if self.fail_values.load(Ordering::SeqCst) {
                return Err(SourceError::Query("injected value failure".into()));
            }
            let rows = self.rows.lock().unwrap();
            Ok(rows.get((id - 1) as usize).cloned().unwrap_or_default())
        })
        .await
    }
}

/// Trigger that rewrites every row of a ScriptedSource.
pub struct SetAllTrigger {
    pub source: Arc<ScriptedSource>,
    pub value: String,
}

impl TriggerAction for SetAllTrigger {
    async fn execute(&self, _cancel: CancellationToken) -> Result<(), TriggerError> {
        self.source.set_all(&self.value);
        Ok(())
    }
}

/// Trigger that takes `duration` unless cancelled first.
pub struct SlowTrigger {
    pub duration: Duration,
}

impl TriggerAction for SlowTrigger {
    async fn execute(&self, cancel: CancellationToken) -> Result<(), TriggerError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(TriggerError::Cancelled),
            _ = tokio::time::sleep(self.duration) => Ok(()),
        }
    }
}

/// Trigger that never looks at its cancellation token.
pub struct UncooperativeTrigger {
    pub duration: Duration,
}

impl TriggerAction for UncooperativeTrigger {
    async fn execute(&self, _cancel: CancellationToken) -> Result<(), TriggerError> {
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

pub fn sample(worker_id: usize, value: &str, changed: bool) -> Sample {
    Sample {
        timestamp: Utc::now(),
        worker_id,
        value: value.into(),
        error: None,
        changed,
        duration: Duration::from_millis(10),
        congestion: 1,
    }
}
