// Config loading and validation tests

use lagprobe::config::AppConfig;
use lagprobe::harness::HarnessConfig;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[database]
path = "data/replica.db"
max_pool_size = 10
table = "items"
value_column = "updated_at"

[probe]
workers = 8
target_rps = 200
query_timeout_ms = 1500
max_congestion = 4
window_secs = 30
warmup_secs = 5

[trigger]
statements = ["UPDATE items SET updated_at = '2025-01-02'"]

[output]
samples_csv = "out/samples.csv"
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.database.path, "data/replica.db");
    assert_eq!(config.database.table, "items");
    assert_eq!(config.database.id_column, "id");
    assert_eq!(config.probe.workers, 8);
    assert_eq!(config.probe.target_rps, 200);
    assert_eq!(config.probe.max_congestion, 4);
    assert_eq!(config.trigger.statements.len(), 1);
    assert_eq!(config.output.samples_csv.as_deref(), Some("out/samples.csv"));
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    assert_eq!(config.probe.sample_interval_ms, 100);
    assert!(config.probe.baseline.is_none());
    assert!(config.output.report_json.is_none());
    assert_eq!(config.output.timeline_width, 60);

    let minimal = r#"
[database]
path = "db"
max_pool_size = 1
table = "t"
value_column = "v"

[probe]
workers = 1
window_secs = 10
"#;
    let config = AppConfig::load_from_str(minimal).expect("minimal");
    assert_eq!(config.probe.target_rps, 0);
    assert_eq!(config.probe.max_congestion, 0);
    assert_eq!(config.probe.warmup_secs, 0);
    assert_eq!(config.probe.query_timeout_ms, 2000);
    assert!(config.trigger.statements.is_empty());
}

#[test]
fn test_harness_config_from_probe() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    let h = HarnessConfig::from(&config.probe);
    assert_eq!(h.workers, 8);
    assert_eq!(h.query_timeout, Duration::from_millis(1500));
    assert_eq!(h.window, Duration::from_secs(30));
    assert_eq!(h.warmup, Duration::from_secs(5));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/replica.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 10", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_non_identifier_table() {
    let bad = VALID_CONFIG.replace("table = \"items\"", "table = \"items; DROP TABLE x\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.table"));
}

#[test]
fn test_config_validation_rejects_non_identifier_column() {
    let bad = VALID_CONFIG.replace(
        "value_column = \"updated_at\"",
        "value_column = \"a\\\"b\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.value_column"));
}

#[test]
fn test_config_validation_rejects_zero_workers() {
    let bad = VALID_CONFIG.replace("workers = 8", "workers = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("probe.workers"));
}

#[test]
fn test_config_validation_rejects_query_timeout_zero() {
    let bad = VALID_CONFIG.replace("query_timeout_ms = 1500", "query_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("query_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_window_zero() {
    let bad = VALID_CONFIG
        .replace("window_secs = 30", "window_secs = 0")
        .replace("warmup_secs = 5", "warmup_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("window_secs"));
}

#[test]
fn test_config_validation_rejects_warmup_past_window() {
    let bad = VALID_CONFIG.replace("warmup_secs = 5", "warmup_secs = 30");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("warmup_secs"));
}

#[test]
fn test_config_validation_rejects_timeline_width_zero() {
    let bad = format!("{}timeline_width = 0\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("timeline_width"));
}

#[test]
fn test_config_validation_rejects_timeline_width_too_large() {
    let bad = format!("{}timeline_width = 4294967296\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("timeline_width"));
    let ok = format!("{}timeline_width = 1000\n", VALID_CONFIG);
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_config_validation_rejects_target_rps_above_nanosecond_cadence() {
    let bad = VALID_CONFIG.replace("target_rps = 200", "target_rps = 1000000001");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("target_rps"));
    let ok = VALID_CONFIG.replace("target_rps = 200", "target_rps = 1000000000");
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.probe.workers, 8);
    assert_eq!(config.database.path, "data/replica.db");
}
