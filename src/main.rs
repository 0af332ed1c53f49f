use anyhow::Result;
use lagprobe::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!("{} {}", version::NAME, version::VERSION);
    let app_config = config::AppConfig::load()?;
    let db = &app_config.database;
    let source = Arc::new(
        source::SqliteSource::connect(
            &db.path,
            db.max_pool_size,
            &db.table,
            &db.id_column,
            &db.value_column,
        )
        .await?,
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received interrupt; closing window early");
                cancel.cancel();
            }
        }
    });

    let harness_config = harness::HarnessConfig::from(&app_config.probe);
    let statements = app_config.trigger.statements.clone();
    let outcome = if statements.is_empty() {
        tracing::warn!("no trigger statements configured; sampling without a mutation");
        harness::run(source, trigger::NoopTrigger, harness_config, cancel).await
    } else {
        let action = trigger::SqlTrigger::new(source.pool().clone(), statements);
        harness::run(source, action, harness_config, cancel).await
    };

    if let Some(path) = &app_config.output.samples_csv {
        report::csv::write_samples_file(path, &outcome.samples)?;
        tracing::info!(path = %path, samples = outcome.samples.len(), "samples written");
    }
    if let Some(path) = &app_config.output.report_json {
        report::write_report_json(path, &outcome)?;
        tracing::info!(path = %path, "report written");
    }

    println!("{}", report::summary::render(&outcome));
    println!(
        "{}",
        report::timeline::render(&outcome, app_config.output.timeline_width)
    );
    Ok(())
}
