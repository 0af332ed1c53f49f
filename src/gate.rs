// Fail-fast congestion gate: one atomic in-flight counter, no queueing.
// A full gate surfaces as an error sample rather than a hidden wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("congestion gate full: {in_flight} in flight (cap {cap})")]
pub struct GateFull {
    pub in_flight: usize,
    pub cap: usize,
}

/// Shared by all workers of one run; clones share the counter.
#[derive(Debug, Clone)]
pub struct CongestionGate {
    in_flight: Arc<AtomicUsize>,
    cap: usize,
}

impl CongestionGate {
    /// `cap == 0` means unlimited.
    pub fn new(cap: usize) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Current number of outstanding leases.
    pub fn level(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Takes a lease unless that would push the count past the cap. Never waits.
    pub fn try_enter(&self) -> Result<CongestionLease, GateFull> {
        let cap = self.cap;
        match self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (cap == 0 || n < cap).then_some(n + 1)
            }) {
            Ok(prev) => Ok(CongestionLease {
                in_flight: self.in_flight.clone(),
                level: prev + 1,
            }),
            Err(current) => Err(GateFull {
                in_flight: current,
                cap,
            }),
        }
    }
}

/// Releases its slot on drop, including when the holder is cancelled mid-attempt.
#[derive(Debug)]
pub struct CongestionLease {
    in_flight: Arc<AtomicUsize>,
    level: usize,
}

impl CongestionLease {
    /// In-flight count at the moment this lease was granted (itself included).
    pub fn level(&self) -> usize {
        self.level
    }
}

impl Drop for CongestionLease {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_is_enforced_and_released_on_drop() {
        let gate = CongestionGate::new(2);
        let a = gate.try_enter().unwrap();
        let b = gate.try_enter().unwrap();
        assert_eq!(a.level(), 1);
        assert_eq!(b.level(), 2);
        let err = gate.try_enter().unwrap_err();
        assert_eq!(err, GateFull { in_flight: 2, cap: 2 });
        drop(a);
        assert_eq!(gate.level(), 1);
        let c = gate.try_enter().unwrap();
        assert_eq!(c.level(), 2);
    }

    #[test]
    fn zero_cap_is_unbounded() {
        let gate = CongestionGate::new(0);
        let leases: Vec<_> = (0..1000).map(|_| gate.try_enter().unwrap()).collect();
        assert_eq!(gate.level(), 1000);
        drop(leases);
        assert_eq!(gate.level(), 0);
    }

    #[test]
    fn concurrent_entries_never_exceed_cap() {
        let gate = CongestionGate::new(3);
        let peak = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let peak = peak.clone();
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        if let Ok(lease) = gate.try_enter() {
                            peak.fetch_max(lease.level(), Ordering::Relaxed);
                            assert!(gate.level() <= 3);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(peak.load(Ordering::Relaxed) <= 3);
        assert_eq!(gate.level(), 0);
    }
}
