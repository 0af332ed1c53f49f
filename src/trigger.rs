// One-shot trigger: waits out the warm-up, runs the mutating action once, and reports
// {start, end, error} on a single-slot channel. Failures are reported, never retried.

use crate::models::TriggerResult;
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("trigger cancelled")]
    Cancelled,
    #[error("trigger action failed: {0}")]
    Action(String),
}

impl From<sqlx::Error> for TriggerError {
    fn from(e: sqlx::Error) -> Self {
        TriggerError::Action(e.to_string())
    }
}

/// The mutation whose visibility latency is measured. Only timed and reported by the harness.
pub trait TriggerAction: Send + Sync + 'static {
    fn execute(
        &self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), TriggerError>> + Send;
}

/// Does nothing; lets a run measure steady-state sampling without a mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrigger;

impl TriggerAction for NoopTrigger {
    async fn execute(&self, _cancel: CancellationToken) -> Result<(), TriggerError> {
        Ok(())
    }
}

/// Runs a fixed list of SQL statements in one transaction.
pub struct SqlTrigger {
    pool: SqlitePool,
    statements: Vec<String>,
}

impl SqlTrigger {
    pub fn new(pool: SqlitePool, statements: Vec<String>) -> Self {
        Self { pool, statements }
    }

    async fn apply(&self) -> Result<(), TriggerError> {
        let mut tx = self.pool.begin().await?;
        for statement in &self.statements {
            sqlx::query(statement.as_str()).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

impl TriggerAction for SqlTrigger {
    async fn execute(&self, cancel: CancellationToken) -> Result<(), TriggerError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TriggerError::Cancelled),
            r = self.apply() => r,
        }
    }
}

/// Fires `action` once after `delay`. If cancelled before firing, nothing is sent.
pub fn schedule<A: TriggerAction>(
    action: A,
    delay: Duration,
    cancel: CancellationToken,
) -> (JoinHandle<()>, oneshot::Receiver<TriggerResult>) {
    let (result_tx, result_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("trigger cancelled before firing");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let start = Utc::now();
        info!(operation = "trigger", "trigger started");
        let outcome = action.execute(cancel.child_token()).await;
        let end = Utc::now();

        let error = match outcome {
            Ok(()) => {
                info!(
                    operation = "trigger",
                    elapsed_ms = (end - start).num_milliseconds(),
                    "trigger finished"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, operation = "trigger", "trigger failed");
                Some(e.to_string())
            }
        };
        // The receiver may already be gone if the window closed first.
        let _ = result_tx.send(TriggerResult { start, end, error });
    });
    (handle, result_rx)
}
