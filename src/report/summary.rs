// Plain-text run summary.

use std::fmt::Write;
use std::time::Duration;

use crate::models::Report;

fn ms(d: Duration) -> String {
    format!("{:.1}ms", d.as_secs_f64() * 1000.0)
}

fn ts(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

pub fn render(report: &Report) -> String {
    let stats = &report.stats;
    let mut out = String::new();

    let baseline = if report.baseline.is_empty() {
        "(none observed)"
    } else {
        report.baseline.as_str()
    };
    let _ = writeln!(out, "baseline:      {}", baseline);
    let _ = writeln!(
        out,
        "window:        {} .. {} ({:?})",
        ts(report.window.start),
        ts(report.window.end),
        report.window.duration()
    );

    match &report.trigger {
        Some(t) => {
            let status = match &t.error {
                None => "ok".to_string(),
                Some(e) => format!("error: {}", e),
            };
            let _ = writeln!(
                out,
                "trigger:       {} .. {} ({}) {}",
                ts(t.start),
                ts(t.end),
                ms(t.elapsed()),
                status
            );
        }
        None => {
            let _ = writeln!(out, "trigger:       no result (not finished before window end)");
        }
    }

    match &stats.first_change {
        Some(c) => {
            let _ = write!(
                out,
                "first change:  {} value={} worker={}",
                ts(c.at),
                c.value,
                c.worker_id
            );
            if let Some(lag) = report.change_latency() {
                let _ = write!(out, " ({}ms after trigger start)", lag.num_milliseconds());
            }
            let _ = writeln!(out);
        }
        None => {
            let _ = writeln!(out, "first change:  none observed");
        }
    }

    let _ = writeln!(
        out,
        "samples:       total={} success={} error={} (error rate {:.2}%)",
        stats.total,
        stats.success,
        stats.errors,
        stats.error_rate() * 100.0
    );
    let _ = writeln!(
        out,
        "latency:       p50={} p90={} p99={} max={}",
        ms(stats.latency.p50),
        ms(stats.latency.p90),
        ms(stats.latency.p99),
        ms(stats.latency.max)
    );
    out
}
