// ASCII timeline of the observation window.
//   '#' bucket saw a changed value, '.' only unchanged successes, 'x' only errors, ' ' nothing.
// The marker line carries 'T' at trigger start and 'C' at the first change.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::models::{ObservationWindow, Report};

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    changed: u32,
    ok: u32,
    errors: u32,
}

impl Bucket {
    fn glyph(&self) -> char {
        if self.changed > 0 {
            '#'
        } else if self.ok > 0 {
            '.'
        } else if self.errors > 0 {
            'x'
        } else {
            ' '
        }
    }
}

/// Bucket index for `at`, or None when outside the window.
fn bucket_of(window: &ObservationWindow, width: usize, at: DateTime<Utc>) -> Option<usize> {
    if at < window.start || at > window.end {
        return None;
    }
    let span = (window.end - window.start).num_nanoseconds()?.max(1) as f64;
    let offset = (at - window.start).num_nanoseconds()? as f64;
    let idx = (offset / span * width as f64).floor() as usize;
    Some(idx.min(width - 1))
}

pub fn render(report: &Report, width: usize) -> String {
    let width = width.max(1);
    let mut buckets = vec![Bucket::default(); width];
    for s in &report.samples {
        let Some(i) = bucket_of(&report.window, width, s.timestamp) else {
            continue;
        };
        if s.errored {
            buckets[i].errors += 1;
        } else if s.changed {
            buckets[i].changed += 1;
        } else {
            buckets[i].ok += 1;
        }
    }

    let mut markers = vec![' '; width];
    if let Some(i) = report
        .trigger
        .as_ref()
        .and_then(|t| bucket_of(&report.window, width, t.start))
    {
        markers[i] = 'T';
    }
    if let Some(i) = report
        .stats
        .first_change
        .as_ref()
        .and_then(|c| bucket_of(&report.window, width, c.at))
    {
        markers[i] = 'C';
    }

    let per_bucket = report.window.duration().div_f64(width as f64);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "timeline {} .. {} ({} buckets of {:?})",
        report.window.start.format("%H:%M:%S%.3f"),
        report.window.end.format("%H:%M:%S%.3f"),
        width,
        per_bucket
    );
    let _ = writeln!(out, "|{}|", buckets.iter().map(Bucket::glyph).collect::<String>());
    let _ = writeln!(out, "|{}|", markers.iter().collect::<String>());
    out
}
