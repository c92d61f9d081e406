//! Counters kept by a running controller and the snapshot handed to hosts.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;

/// Live counters shared between the controller, its timer task and every
/// in-flight fetch.
#[derive(Debug, Default)]
pub(crate) struct RefreshCounters {
    ticks: AtomicU64,
    skipped: AtomicU64,
    dispatched: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    started_at: Mutex<Option<DateTime<Utc>>>,
    last_tick_at: Mutex<Option<DateTime<Utc>>>,
    idle: Notify,
}

impl RefreshCounters {
    pub(crate) fn mark_started(&self) {
        *self.started_at.lock() = Some(Utc::now());
    }

    /// Record a tick and return its zero-based sequence number.
    pub(crate) fn record_tick(&self) -> u64 {
        *self.last_tick_at.lock() = Some(Utc::now());
        self.ticks.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a dispatched fetch as in flight until the returned guard drops.
    pub(crate) fn begin_fetch(self: &Arc<Self>) -> InFlightGuard {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        InFlightGuard {
            counters: Arc::clone(self),
        }
    }

    /// Resolve once no fetch is in flight.
    pub(crate) async fn wait_idle(&self) {
        loop {
            // Registered before the check so a wakeup between the two is not lost
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    pub(crate) fn snapshot(&self, interval: Duration, is_running: bool) -> RefreshStats {
        RefreshStats {
            interval,
            is_running,
            ticks: self.ticks.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            dispatched: self.dispatched.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
            started_at: *self.started_at.lock(),
            last_tick_at: *self.last_tick_at.lock(),
        }
    }
}

/// Held by a spawned fetch for its whole lifetime.
pub(crate) struct InFlightGuard {
    counters: Arc<RefreshCounters>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.counters.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.counters.idle.notify_waiters();
        }
    }
}

/// Point-in-time view of a controller's activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    pub interval: Duration,
    pub is_running: bool,
    /// Ticks fired, including skipped ones
    pub ticks: u64,
    /// Ticks that found no target set
    pub skipped: u64,
    /// Fetches started
    pub dispatched: u64,
    /// Fetches that returned an error or panicked
    pub failed: u64,
    pub in_flight: usize,
    /// Highest number of fetches observed running at once
    pub peak_in_flight: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub last_tick_at: Option<DateTime<Utc>>,
}

impl fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Auto Refresh Stats:")?;
        writeln!(f, "  Running: {}", self.is_running)?;
        writeln!(f, "  Interval: {:?}", self.interval)?;
        writeln!(
            f,
            "  Ticks: {} ({} skipped without a target)",
            self.ticks, self.skipped
        )?;
        writeln!(
            f,
            "  Fetches: {} dispatched, {} failed, {} in flight (peak {})",
            self.dispatched, self.failed, self.in_flight, self.peak_in_flight
        )?;

        if let Some(last) = self.last_tick_at {
            writeln!(f, "  Last tick: {}", last.to_rfc3339())?;
        }

        Ok(())
    }
}
