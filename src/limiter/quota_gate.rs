//! Counting admission gate with periodic replenishment.
//!
//! The free permit count and the FIFO queue of waiters live under one lock.
//! A returned or replenished permit goes to the oldest waiter first and only
//! lands in the free count when nobody is queued, capped at capacity. A
//! waiter that is dropped after being handed a permit gives it back through
//! the same capped path, so the free count never exceeds capacity.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::analytics::stats::GateStats;
use crate::error::{AppError, Result};
use crate::limiter::period::PeriodUnit;

/// Lower bound for the stall alarm, so a tiny threshold cannot turn the
/// wait loop into a spin.
pub const MIN_STALL_THRESHOLD: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct GateState {
    available: usize,
    closed: bool,
    next_waiter: u64,
    waiters: VecDeque<(u64, oneshot::Sender<()>)>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<GateState>,
    capacity: usize,
    replenishing: AtomicBool,
    stats: GateStats,
}

impl Shared {
    /// Hands one permit to the oldest waiter, or adds it to the free count.
    /// Returns false when the gate is already full.
    fn give_back(&self, state: &mut GateState) -> bool {
        if state.available >= self.capacity {
            return false;
        }
        while let Some((_, tx)) = state.waiters.pop_front() {
            if tx.send(()).is_ok() {
                return true;
            }
        }
        state.available += 1;
        true
    }

    fn release_one(&self) {
        let mut state = self.state.lock();
        self.stats.inc_released();
        if !self.give_back(&mut state) {
            self.stats.inc_saturated_releases();
            debug!("Release saturated at capacity {}", self.capacity);
        }
    }

    fn replenish(&self) -> usize {
        let mut state = self.state.lock();
        let missing = self.capacity.saturating_sub(state.available);
        for _ in 0..missing {
            self.give_back(&mut state);
        }
        self.stats.inc_replenishments();
        missing
    }
}

/// A queued `acquire` call. Dropping it before the permit is observed
/// either leaves the queue or returns the permit it was handed.
struct Waiter<'a> {
    shared: &'a Shared,
    id: u64,
    rx: oneshot::Receiver<()>,
    granted: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.granted {
            return;
        }
        let mut state = self.shared.state.lock();
        if let Some(pos) = state.waiters.iter().position(|(id, _)| *id == self.id) {
            state.waiters.remove(pos);
            return;
        }
        if self.rx.try_recv().is_ok() {
            self.shared.give_back(&mut state);
        }
    }
}

/// Clears the running flag however the replenisher ends, including abort.
struct ReplenisherRunning {
    shared: Arc<Shared>,
}

impl Drop for ReplenisherRunning {
    fn drop(&mut self) {
        self.shared.replenishing.store(false, Ordering::Release);
    }
}

/// Admits at most `capacity` holders per period.
#[derive(Debug)]
pub struct QuotaGate {
    shared: Arc<Shared>,
    period: Duration,
    stall_after: Duration,
    shutdown_tx: broadcast::Sender<()>,
    replenisher: Mutex<Option<JoinHandle<()>>>,
}

impl QuotaGate {
    /// Validates the limits and starts the replenisher on the current tokio
    /// runtime. Nothing is spawned when validation fails.
    pub fn new(capacity: i64, unit: PeriodUnit) -> Result<Self> {
        if capacity <= 0 {
            return Err(AppError::config(format!(
                "Request limit must be positive, got {}",
                capacity
            )));
        }
        let capacity = usize::try_from(capacity).map_err(|_| {
            AppError::config(format!("Request limit {} does not fit this platform", capacity))
        })?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::Init(format!("Quota gate needs a tokio runtime: {}", e)))?;

        let period = unit.duration();
        let shared = Arc::new(Shared {
            state: Mutex::new(GateState {
                available: capacity,
                closed: false,
                next_waiter: 0,
                waiters: VecDeque::new(),
            }),
            capacity,
            replenishing: AtomicBool::new(true),
            stats: GateStats::new(),
        });

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let first_tick = Instant::now() + period;
        let running = ReplenisherRunning {
            shared: shared.clone(),
        };
        let handle = runtime.spawn(run_replenisher(running, first_tick, period, shutdown_rx));

        info!("Quota gate ready: {} request(s) per {}", capacity, unit);

        Ok(Self {
            shared,
            period,
            stall_after: period * 2,
            shutdown_tx,
            replenisher: Mutex::new(Some(handle)),
        })
    }

    /// How long a waiter may block before the gate raises an alarm.
    /// Defaults to two periods; never below [`MIN_STALL_THRESHOLD`].
    pub fn with_stall_threshold(mut self, stall_after: Duration) -> Self {
        self.stall_after = stall_after.max(MIN_STALL_THRESHOLD);
        self
    }

    pub fn stall_threshold(&self) -> Duration {
        self.stall_after
    }

    /// Waits for a free permit. Fails only once the gate has been shut down.
    ///
    /// Dropping the returned future before it resolves leaves the quota as
    /// if the call had never been made.
    pub async fn acquire(&self) -> Result<Permit> {
        let mut waiter = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(closed_error());
            }
            if state.available > 0 {
                state.available -= 1;
                drop(state);
                return Ok(self.admit());
            }

            let id = state.next_waiter;
            state.next_waiter += 1;
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back((id, tx));
            Waiter {
                shared: &self.shared,
                id,
                rx,
                granted: false,
            }
        };
        let started = Instant::now();

        loop {
            tokio::select! {
                res = &mut waiter.rx => {
                    // The sender is only dropped without sending on shutdown.
                    res.map_err(|_| closed_error())?;
                    waiter.granted = true;
                    return Ok(self.admit());
                }
                _ = tokio::time::sleep(self.stall_after) => {
                    self.shared.stats.inc_stalled_waits();
                    if self.is_replenishing() {
                        warn!(
                            "Waiting {:?} for a permit ({} of {} in use)",
                            started.elapsed(),
                            self.shared.capacity - self.available(),
                            self.shared.capacity
                        );
                    } else {
                        error!(
                            "Waiting {:?} for a permit and the replenisher is not running",
                            started.elapsed()
                        );
                    }
                }
            }
        }
    }

    /// Takes a permit only if one is free right now.
    pub fn try_acquire(&self) -> Option<Permit> {
        {
            let mut state = self.shared.state.lock();
            if state.closed || state.available == 0 {
                return None;
            }
            state.available -= 1;
        }
        Some(self.admit())
    }

    fn admit(&self) -> Permit {
        self.shared.stats.inc_admitted();
        Permit {
            shared: self.shared.clone(),
        }
    }

    /// Tops the gate back up to full capacity and returns how many permits
    /// were restored. The replenisher calls this once per period.
    pub fn replenish(&self) -> usize {
        self.shared.replenish()
    }

    pub fn available(&self) -> usize {
        self.shared.state.lock().available
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> &GateStats {
        &self.shared.stats
    }

    pub fn is_replenishing(&self) -> bool {
        self.shared.replenishing.load(Ordering::Acquire)
    }

    /// Stops the replenisher and closes the gate. Pending and future
    /// `acquire` calls fail with [`AppError::Interrupted`]; permits already
    /// handed out can still be released.
    pub async fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.waiters.clear();
        }
        let _ = self.shutdown_tx.send(());

        let handle = self.replenisher.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Quota replenisher task failed: {}", e);
            }
        }

        info!("Quota gate shut down.");
        self.shared.stats.log_stats();
    }
}

fn closed_error() -> AppError {
    AppError::Interrupted("quota gate shut down while waiting for a permit".into())
}

async fn run_replenisher(
    running: ReplenisherRunning,
    first_tick: Instant,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let shared = &running.shared;
    let mut ticker = interval_at(first_tick, period);
    // A late tick replenishes once and the schedule shifts; it is never fatal.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let restored = shared.replenish();
                debug!(
                    "Quota replenished: {} permit(s) restored, {} available",
                    restored,
                    shared.state.lock().available
                );
            }
            // A signal, or the gate itself being dropped.
            _ = shutdown.recv() => break,
        }
    }

    info!("Quota replenisher stopped.");
}

/// One unit of admission. Returned to the gate when released or dropped.
#[derive(Debug)]
#[must_use = "dropping a permit releases it immediately"]
pub struct Permit {
    shared: Arc<Shared>,
}

impl Permit {
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.shared.release_one();
    }
}
