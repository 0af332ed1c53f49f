// Data-source capability consumed by the poll workers.
// The core never opens connections itself; it is handed a ready source.

mod sqlite;

pub use sqlite::SqliteSource;

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for SourceError {
    fn from(e: sqlx::Error) -> Self {
        SourceError::Query(e.to_string())
    }
}

/// Read access to the monitored table.
pub trait DataSource: Send + Sync + 'static {
    /// Current maximum identifier; 0 when the table is empty.
    fn fetch_max_id(&self, timeout: Duration)
    -> impl Future<Output = Result<i64, SourceError>> + Send;

    /// Monitored value of row `id` rendered as text; empty when the row is missing or NULL.
    fn fetch_value_by_id(
        &self,
        id: i64,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Runs `fut` under `timeout`, folding the elapsed case into `SourceError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| SourceError::Timeout(timeout))?
}
