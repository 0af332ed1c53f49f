// Nearest-rank percentiles over query durations.
// Index = floor(n * q) clamped to n - 1, no interpolation, so results are reproducible
// order statistics rather than continuous estimates.

use std::time::Duration;

use crate::models::LatencySummary;

/// `q` in [0, 1]. Empty input yields zero.
pub fn percentile(durations: &[Duration], q: f64) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    sorted[rank(sorted.len(), q)]
}

pub fn percentile90(durations: &[Duration]) -> Duration {
    percentile(durations, 0.90)
}

fn rank(n: usize, q: f64) -> usize {
    let idx = (n as f64 * q.clamp(0.0, 1.0)).floor() as usize;
    idx.min(n - 1)
}

/// p50/p90/p99/max from a single sort.
pub fn summarize(durations: &[Duration]) -> LatencySummary {
    if durations.is_empty() {
        return LatencySummary::default();
    }
    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    LatencySummary {
        p50: sorted[rank(n, 0.50)],
        p90: sorted[rank(n, 0.90)],
        p99: sorted[rank(n, 0.99)],
        max: sorted[n - 1],
    }
}
