// SQLite-backed DataSource via sqlx. Also hands its pool to the SQL trigger.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::instrument;

use super::{DataSource, SourceError, with_timeout};

pub struct SqliteSource {
    pool: SqlitePool,
    max_id_sql: String,
    value_sql: String,
}

impl SqliteSource {
    /// Open an existing database at `path`. Table and column names must already be validated
    /// as plain identifiers (see `AppConfig`).
    pub async fn connect(
        path: &str,
        max_pool_size: u32,
        table: &str,
        id_column: &str,
        value_column: &str,
    ) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(false)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self::from_pool(pool, table, id_column, value_column))
    }

    pub fn from_pool(pool: SqlitePool, table: &str, id_column: &str, value_column: &str) -> Self {
        let max_id_sql = format!(r#"SELECT COALESCE(MAX("{id_column}"), 0) FROM "{table}""#);
        let value_sql = format!(
            r#"SELECT CAST("{value_column}" AS TEXT) FROM "{table}" WHERE "{id_column}" = $1"#
        );
        Self {
            pool,
            max_id_sql,
            value_sql,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl DataSource for SqliteSource {
    #[instrument(skip(self), fields(source = "sqlite", operation = "fetch_max_id"))]
    async fn fetch_max_id(&self, timeout: Duration) -> Result<i64, SourceError> {
        with_timeout(timeout, async {
            let max: i64 = sqlx::query_scalar(&self.max_id_sql)
                .fetch_one(&self.pool)
                .await?;
            Ok(max)
        })
        .await
    }

    #[instrument(skip(self), fields(source = "sqlite", operation = "fetch_value_by_id"))]
    async fn fetch_value_by_id(&self, id: i64, timeout: Duration) -> Result<String, SourceError> {
        with_timeout(timeout, async {
            let value: Option<Option<String>> = sqlx::query_scalar(&self.value_sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(value.flatten().unwrap_or_default())
        })
        .await
    }
}
