//! Scheduled refresh coordinator.
//!
//! [`RefreshCoordinator`] owns the fixed-interval timer and the cached
//! snapshot. Each tick opens a fresh session through a [`SnapshotSource`],
//! fetches accounts and budgets, normalizes them, and swaps the cached
//! snapshot atomically. Failures after the first successful refresh are
//! recorded and logged but never crash the process; readers keep serving
//! the last good snapshot.
//!
//! Concurrency contract: at most one refresh is ever in flight. A tick
//! arriving while a refresh is running is skipped, never queued. The cache
//! is a watch channel carrying `Option<Arc<Snapshot>>`: one writer, many
//! readers, publish-atomic reference swap.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::Result;
use crate::client::wire::RawSnapshot;
use crate::models::Snapshot;

/// Fixed time between scheduled refreshes.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Source of raw snapshot data, one fetch per refresh cycle.
///
/// The production implementation is [`crate::client::BudgetClient`], which
/// opens a session, fetches, and closes it per call. Tests substitute
/// scripted sources.
pub trait SnapshotSource: Send + Sync {
    /// Fetches all raw records for the month containing `as_of`.
    ///
    /// # Errors
    ///
    /// Returns the session adapter's typed failures
    /// (see [`crate::BursarError`]).
    fn fetch<'a>(
        &'a self,
        as_of: NaiveDate,
    ) -> Pin<Box<dyn Future<Output = Result<RawSnapshot>> + Send + 'a>>;
}

/// Outcome bookkeeping for the most recent refresh cycles.
#[derive(Debug, Clone, Default)]
pub struct RefreshStatus {
    /// Wall-clock time of the last successful refresh.
    pub last_success: Option<DateTime<Local>>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

/// Owns the refresh timer and the cached snapshot.
pub struct RefreshCoordinator<S> {
    source: S,
    interval: Duration,
    tx: watch::Sender<Option<Arc<Snapshot>>>,
    refresh_gate: tokio::sync::Mutex<()>,
    status: Mutex<RefreshStatus>,
}

impl<S: SnapshotSource> RefreshCoordinator<S> {
    /// Creates a coordinator with the standard 60-minute cadence.
    pub fn new(source: S) -> Self {
        Self::with_interval(source, REFRESH_INTERVAL)
    }

    /// Creates a coordinator with a custom cadence (tests mostly).
    pub fn with_interval(source: S, interval: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            source,
            interval,
            tx,
            refresh_gate: tokio::sync::Mutex::new(()),
            status: Mutex::new(RefreshStatus::default()),
        }
    }

    /// The underlying snapshot source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a reader handle onto the cached snapshot.
    pub fn handle(&self) -> SnapshotHandle {
        SnapshotHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns a copy of the current refresh bookkeeping.
    pub fn status(&self) -> RefreshStatus {
        self.lock_status().clone()
    }

    /// Mandatory initial refresh.
    ///
    /// # Errors
    ///
    /// Unlike scheduled ticks, a failure here propagates; setup must abort
    /// and no sensors may be created.
    pub async fn first_refresh(&self) -> Result<()> {
        self.refresh_once().await
    }

    /// Runs one refresh cycle, unless one is already in flight.
    ///
    /// A coalesced (skipped) tick returns `Ok(())` without touching the
    /// cache or the status record.
    ///
    /// # Errors
    ///
    /// Propagates the source's failure after recording it; the cached
    /// snapshot is left untouched.
    pub async fn refresh_once(&self) -> Result<()> {
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            debug!("refresh already in flight, coalescing tick");
            return Ok(());
        };

        let as_of = Local::now().date_naive();
        match self.source.fetch(as_of).await {
            Ok(raw) => {
                let snapshot = Snapshot::from_raw(raw.accounts, raw.budgets);
                info!(
                    accounts = snapshot.accounts.len(),
                    budgets = snapshot.budgets.len(),
                    "refresh succeeded"
                );
                self.tx.send_replace(Some(Arc::new(snapshot)));
                let mut status = self.lock_status();
                status.last_success = Some(Local::now());
                status.consecutive_failures = 0;
                status.last_error = None;
                Ok(())
            }
            Err(e) => {
                let mut status = self.lock_status();
                status.consecutive_failures += 1;
                status.last_error = Some(e.to_string());
                drop(status);
                Err(e)
            }
        }
    }

    /// Drives the fixed-interval refresh loop forever.
    ///
    /// Tick failures are recorded and logged, never propagated. A refresh
    /// outlasting the interval delays the next tick rather than stacking
    /// (`MissedTickBehavior::Delay`); combined with the in-flight gate this
    /// keeps refreshes strictly sequential.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // An interval's first tick completes immediately; the caller already
        // ran the mandatory initial refresh, so consume it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_once().await {
                warn!(error = %e, "scheduled refresh failed, keeping previous snapshot");
            }
        }
    }

    fn lock_status(&self) -> std::sync::MutexGuard<'_, RefreshStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Read-only handle onto the coordinator's cached snapshot.
///
/// Cheap to clone; every read observes the latest published snapshot in
/// full, never a partial update.
#[derive(Clone)]
pub struct SnapshotHandle {
    rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotHandle {
    /// The latest snapshot, or `None` if no refresh has ever succeeded.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().clone()
    }

    /// Whether any refresh has ever succeeded.
    pub fn has_data(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Waits until a new snapshot is published. Returns `false` once the
    /// coordinator is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
