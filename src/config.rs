use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub probe: ProbeConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Monitored table. Identifiers are interpolated into SQL, so only [A-Za-z0-9_] is accepted.
    pub table: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    pub value_column: String,
}

fn default_id_column() -> String {
    "id".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    pub workers: usize,
    /// Aggregate attempts per second across all workers. 0 = each worker ticks on its own
    /// sample_interval_ms.
    #[serde(default)]
    pub target_rps: u32,
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Max simultaneous in-flight samples (0 = unlimited).
    #[serde(default)]
    pub max_congestion: usize,
    pub window_secs: u64,
    #[serde(default)]
    pub warmup_secs: u64,
    /// Known pre-mutation value. When omitted, the first non-empty sample becomes the baseline.
    #[serde(default)]
    pub baseline: Option<String>,
}

fn default_sample_interval_ms() -> u64 {
    100
}

fn default_query_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerConfig {
    /// Statements run in one transaction when the trigger fires. Empty = no mutation.
    #[serde(default)]
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub samples_csv: Option<String>,
    #[serde(default)]
    pub report_json: Option<String>,
    #[serde(default = "default_timeline_width")]
    pub timeline_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            samples_csv: None,
            report_json: None,
            timeline_width: default_timeline_width(),
        }
    }
}

/// One attempt per nanosecond is the finest cadence a tokio interval can express.
pub const MAX_TARGET_RPS: u32 = 1_000_000_000;
pub const MAX_TIMELINE_WIDTH: usize = 1_000;

fn default_timeline_width() -> usize {
    60
}

fn is_sql_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            is_sql_identifier(&self.database.table),
            "database.table must be a plain identifier, got {:?}",
            self.database.table
        );
        anyhow::ensure!(
            is_sql_identifier(&self.database.id_column),
            "database.id_column must be a plain identifier, got {:?}",
            self.database.id_column
        );
        anyhow::ensure!(
            is_sql_identifier(&self.database.value_column),
            "database.value_column must be a plain identifier, got {:?}",
            self.database.value_column
        );
        anyhow::ensure!(
            self.probe.workers > 0,
            "probe.workers must be > 0, got {}",
            self.probe.workers
        );
        anyhow::ensure!(
            self.probe.target_rps <= MAX_TARGET_RPS,
            "probe.target_rps must be <= {}, got {}",
            MAX_TARGET_RPS,
            self.probe.target_rps
        );
        anyhow::ensure!(
            self.probe.sample_interval_ms > 0,
            "probe.sample_interval_ms must be > 0, got {}",
            self.probe.sample_interval_ms
        );
        anyhow::ensure!(
            self.probe.query_timeout_ms > 0,
            "probe.query_timeout_ms must be > 0, got {}",
            self.probe.query_timeout_ms
        );
        anyhow::ensure!(
            self.probe.window_secs > 0,
            "probe.window_secs must be > 0, got {}",
            self.probe.window_secs
        );
        anyhow::ensure!(
            self.probe.warmup_secs < self.probe.window_secs,
            "probe.warmup_secs must be < probe.window_secs, got {} >= {}",
            self.probe.warmup_secs,
            self.probe.window_secs
        );
        anyhow::ensure!(
            (1..=MAX_TIMELINE_WIDTH).contains(&self.output.timeline_width),
            "output.timeline_width must be in 1..={}, got {}",
            MAX_TIMELINE_WIDTH,
            self.output.timeline_width
        );
        Ok(())
    }
}
