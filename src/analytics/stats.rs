use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counters kept by a quota gate over its lifetime.
#[derive(Debug)]
pub struct GateStats {
    pub admitted: AtomicU64,
    pub released: AtomicU64,
    // Releases that hit the capacity cap because a replenish already
    // returned the permit.
    pub saturated_releases: AtomicU64,
    pub replenishments: AtomicU64,
    pub failed_operations: AtomicU64,
    pub stalled_waits: AtomicU64,
}

impl GateStats {
    pub fn new() -> Self {
        Self {
            admitted: AtomicU64::new(0),
            released: AtomicU64::new(0),
            saturated_releases: AtomicU64::new(0),
            replenishments: AtomicU64::new(0),
            failed_operations: AtomicU64::new(0),
            stalled_waits: AtomicU64::new(0),
        }
    }

    pub fn inc_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_saturated_releases(&self) {
        self.saturated_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_replenishments(&self) {
        self.replenishments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_operations(&self) {
        self.failed_operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stalled_waits(&self) {
        self.stalled_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn log_stats(&self) {
        let admitted = self.admitted.load(Ordering::Relaxed);
        let released = self.released.load(Ordering::Relaxed);
        let saturated = self.saturated_releases.load(Ordering::Relaxed);
        let replenished = self.replenishments.load(Ordering::Relaxed);
        let failed = self.failed_operations.load(Ordering::Relaxed);
        let stalled = self.stalled_waits.load(Ordering::Relaxed);

        info!(
            "GATE STATS: Admitted: {} | Released: {} ({} saturated) | \
             Replenishments: {} | Failed operations: {} | Stall alarms: {}",
            admitted, released, saturated, replenished, failed, stalled
        );
    }
}

impl Default for GateStats {
    fn default() -> Self {
        Self::new()
    }
}
