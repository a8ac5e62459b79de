//! TTL snapshot cache with single-flight refresh.
//!
//! The slot moves Empty -> Fetching -> Cached -> Stale -> Fetching. Fresh
//! reads never touch the network. When the slot has expired, the first
//! caller spawns one fetch/parse/process cycle as a detached task and parks
//! a shared handle to it in the slot; every later caller awaits that same
//! handle until the task installs its result.
//!
//! The cycle belongs to the task, not to any caller. A caller that is
//! dropped mid-fetch stops waiting and nothing else: the refresh still runs
//! to completion and is never restarted by the next caller.
//!
//! A failed refresh keeps the previous snapshot and still restarts the TTL
//! window, so an unreachable sheet is retried once per TTL rather than on
//! every request.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::RwLock;

use crate::client::SheetSource;
use crate::clock::{Clock, SystemClock};
use crate::processor::ingest_csv;
use crate::types::{ProcessedSnapshot, SiteRecord, SnapshotCounts};

/// Default validity window for a fetched snapshot, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 300;

/// What callers get back: the snapshot plus how trustworthy it is.
#[derive(Debug, Clone)]
pub struct SnapshotView {
    pub snapshot: Arc<ProcessedSnapshot>,
    /// When the snapshot's data was last fetched successfully.
    pub fetched_at: Option<DateTime<FixedOffset>>,
    /// `true` if the last refresh failed or nothing has been fetched yet.
    pub stale: bool,
    pub last_error: Option<String>,
}

type InFlight = Shared<BoxFuture<'static, SnapshotView>>;

#[derive(Default)]
struct Slot {
    snapshot: Option<Arc<ProcessedSnapshot>>,
    fetched_at: Option<DateTime<FixedOffset>>,
    /// Completion time of the last refresh attempt, successful or not.
    checked_at: Option<DateTime<FixedOffset>>,
    last_error: Option<String>,
    /// Set while a refresh task is running; cleared by that task.
    in_flight: Option<InFlight>,
}

enum Refresh {
    Ready(SnapshotView),
    Pending(InFlight),
}

struct Inner<S, C> {
    source: S,
    clock: C,
    ttl: TimeDelta,
    slot: RwLock<Slot>,
}

pub struct SnapshotCache<S, C = SystemClock> {
    inner: Arc<Inner<S, C>>,
}

impl<S: SheetSource + 'static> SnapshotCache<S, SystemClock> {
    /// Cache over `source` using the wall clock pinned to `offset`.
    pub fn new(source: S, ttl: TimeDelta, offset: Option<FixedOffset>) -> Self {
        Self::with_clock(source, SystemClock::new(offset), ttl)
    }
}

impl<S: SheetSource + 'static, C: Clock + 'static> SnapshotCache<S, C> {
    pub fn with_clock(source: S, clock: C, ttl: TimeDelta) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                clock,
                ttl,
                slot: RwLock::new(Slot::default()),
            }),
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.inner.ttl
    }

    /// Returns the current snapshot, refreshing it first if the TTL expired.
    ///
    /// Never fails: fetch errors are logged and reported through
    /// [`SnapshotView::stale`] and [`SnapshotView::last_error`]. Must be
    /// called from within a Tokio runtime.
    pub async fn snapshot(&self) -> SnapshotView {
        if let Some(view) = self.inner.fresh_view().await {
            return view;
        }

        match self.join_or_start_refresh().await {
            Refresh::Ready(view) => view,
            Refresh::Pending(flight) => flight.await,
        }
    }

    /// Returns whatever is cached without triggering a fetch.
    pub async fn peek(&self) -> SnapshotView {
        self.inner.peek().await
    }

    pub async fn all_sites(&self) -> Vec<SiteRecord> {
        self.snapshot().await.snapshot.all_sites.clone()
    }

    pub async fn central_sites(&self) -> Vec<SiteRecord> {
        self.snapshot().await.snapshot.central_sites.clone()
    }

    /// Overdue and today together.
    pub async fn due_today(&self) -> Vec<SiteRecord> {
        self.snapshot().await.snapshot.due_today.clone()
    }

    pub async fn summary_counts(&self) -> SnapshotCounts {
        self.snapshot().await.snapshot.counts
    }

    pub async fn full_snapshot(&self) -> Arc<ProcessedSnapshot> {
        self.snapshot().await.snapshot
    }

    async fn join_or_start_refresh(&self) -> Refresh {
        let mut slot = self.inner.slot.write().await;

        if let Some(flight) = &slot.in_flight {
            return Refresh::Pending(flight.clone());
        }
        // A refresh may have finished while we waited for the write lock.
        if self.inner.is_fresh(&slot) {
            return Refresh::Ready(self.inner.view_of(&slot));
        }

        let flight = self.spawn_refresh();
        slot.in_flight = Some(flight.clone());
        Refresh::Pending(flight)
    }

    /// The task cannot install its result before the caller releases the
    /// slot write lock, so `in_flight` is always set before it is cleared.
    fn spawn_refresh(&self) -> InFlight {
        let task = tokio::spawn(Arc::clone(&self.inner).run_refresh());
        let inner = Arc::clone(&self.inner);

        async move {
            match task.await {
                Ok(view) => view,
                Err(e) => {
                    tracing::error!(error = %e, "fuel plan refresh task did not complete");
                    inner.slot.write().await.in_flight = None;
                    inner.peek().await
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl<S: SheetSource, C: Clock> Inner<S, C> {
    async fn fresh_view(&self) -> Option<SnapshotView> {
        let slot = self.slot.read().await;
        self.is_fresh(&slot).then(|| self.view_of(&slot))
    }

    async fn peek(&self) -> SnapshotView {
        let slot = self.slot.read().await;
        self.view_of(&slot)
    }

    fn is_fresh(&self, slot: &Slot) -> bool {
        slot.checked_at.is_some_and(|checked_at| self.clock.now() - checked_at < self.ttl)
    }

    async fn fetch_snapshot(&self) -> Result<ProcessedSnapshot, String> {
        let text = self.source.fetch_csv().await.map_err(|e| e.to_string())?;
        Ok(ingest_csv(&text, &self.clock.now()))
    }

    /// One fetch/parse/process cycle. Always clears `in_flight`, even if
    /// ingestion panics.
    async fn run_refresh(self: Arc<Self>) -> SnapshotView {
        let result = AssertUnwindSafe(self.fetch_snapshot())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err("fuel plan ingestion panicked".to_owned()));
        let now = self.clock.now();

        let mut slot = self.slot.write().await;
        match result {
            Ok(snapshot) => {
                tracing::info!(
                    total = snapshot.counts.total,
                    due_today = snapshot.counts.due_today,
                    tomorrow = snapshot.counts.tomorrow,
                    after_tomorrow = snapshot.counts.after_tomorrow,
                    "fuel plan snapshot refreshed"
                );
                slot.snapshot = Some(Arc::new(snapshot));
                slot.fetched_at = Some(now);
                slot.last_error = None;
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    has_previous = slot.snapshot.is_some(),
                    "fuel plan refresh failed; serving previous snapshot"
                );
                slot.last_error = Some(error);
            }
        }
        slot.checked_at = Some(now);
        slot.in_flight = None;

        self.view_of(&slot)
    }

    fn view_of(&self, slot: &Slot) -> SnapshotView {
        let snapshot = slot.snapshot.clone().unwrap_or_else(|| {
            Arc::new(ProcessedSnapshot::empty(self.clock.now().date_naive()))
        });
        SnapshotView {
            snapshot,
            fetched_at: slot.fetched_at,
            stale: slot.fetched_at.is_none() || slot.last_error.is_some(),
            last_error: slot.last_error.clone(),
        }
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
