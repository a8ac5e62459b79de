use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::DateTime;
use futures::future::join_all;

use super::*;
use crate::clock::ManualClock;
use crate::error::FetchError;

/// Canned sheet source that counts calls and can be switched to failing.
struct StubSource {
    calls: AtomicUsize,
    fail: AtomicBool,
    body: StdMutex<String>,
    delay: Duration,
}

impl StubSource {
    fn new(body: String) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            body: StdMutex::new(body),
            delay: Duration::ZERO,
        }
    }

    fn slow(body: String) -> Self {
        Self::with_delay(body, Duration::from_millis(20))
    }

    fn with_delay(body: String, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(body)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn set_body(&self, body: String) {
        *self.body.lock().expect("body lock") = body;
    }
}

impl SheetSource for StubSource {
    fn fetch_csv(&self) -> impl std::future::Future<Output = Result<String, FetchError>> + Send {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::UnexpectedStatus {
                    status: 503,
                    url: "https://sheets.example.com/pub".to_owned(),
                });
            }
            let body = self.body.lock().expect("body lock").clone();
            Ok(body)
        }
    }
}

fn start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-10-17T08:00:00+03:00").expect("timestamp")
}

fn ttl() -> TimeDelta {
    TimeDelta::seconds(DEFAULT_TTL_SECS)
}

/// Header plus one 36-column row per `(site, region, lat, lng, date)`.
fn sheet_csv(rows: &[(&str, &str, &str, &str, &str)]) -> String {
    let mut header = vec!["col".to_owned(); 36];
    header[1] = "SiteName".to_owned();
    header[35] = "NextFuelingPlan".to_owned();
    let mut out = header.join(",");
    out.push('\n');
    for (site, region, lat, lng, date) in rows {
        let mut cells = vec![String::new(); 36];
        cells[1] = (*site).to_owned();
        cells[3] = (*region).to_owned();
        cells[11] = (*lat).to_owned();
        cells[12] = (*lng).to_owned();
        cells[35] = (*date).to_owned();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn one_site_csv() -> String {
    sheet_csv(&[("COW1", "Central Zone", "24.5", "46.7", "2026-10-17")])
}

fn cache_with(source: StubSource) -> SnapshotCache<StubSource, ManualClock> {
    SnapshotCache::with_clock(source, ManualClock::new(start()), ttl())
}

#[tokio::test]
async fn first_call_fetches_and_later_calls_hit_cache() {
    let cache = cache_with(StubSource::new(one_site_csv()));

    let first = cache.snapshot().await;
    assert_eq!(first.snapshot.counts.total, 1);
    assert!(!first.stale);
    assert_eq!(first.fetched_at, Some(start()));

    cache.inner.clock.advance(TimeDelta::seconds(DEFAULT_TTL_SECS - 1));
    let second = cache.snapshot().await;
    assert!(Arc::ptr_eq(&first.snapshot, &second.snapshot));
    assert_eq!(cache.inner.source.calls(), 1);
}

#[tokio::test]
async fn expired_snapshot_is_refetched() {
    let cache = cache_with(StubSource::new(one_site_csv()));
    cache.snapshot().await;

    cache.inner.source.set_body(sheet_csv(&[
        ("COW1", "Central Zone", "24.5", "46.7", "2026-10-17"),
        ("COW2", "West", "21.4", "39.1", "2026-10-18"),
    ]));
    cache.inner.clock.advance(ttl());

    let view = cache.snapshot().await;
    assert_eq!(cache.inner.source.calls(), 2);
    assert_eq!(view.snapshot.counts.total, 2);
    assert_eq!(view.snapshot.counts.tomorrow, 1);
}

#[tokio::test]
async fn concurrent_cold_callers_share_one_fetch() {
    let cache = SnapshotCache::with_clock(
        StubSource::slow(one_site_csv()),
        ManualClock::new(start()),
        ttl(),
    );

    let views = join_all((0..16).map(|_| cache.snapshot())).await;

    assert_eq!(cache.inner.source.calls(), 1);
    let first = &views[0].snapshot;
    assert!(views.iter().all(|v| Arc::ptr_eq(&v.snapshot, first)));
    assert!(views.iter().all(|v| v.snapshot.counts.total == 1));
}

#[tokio::test]
async fn concurrent_callers_after_expiry_share_one_refresh() {
    let cache = SnapshotCache::with_clock(
        StubSource::slow(one_site_csv()),
        ManualClock::new(start()),
        ttl(),
    );
    cache.snapshot().await;
    cache.inner.clock.advance(ttl() + TimeDelta::seconds(1));

    let views = join_all((0..8).map(|_| cache.snapshot())).await;

    assert_eq!(cache.inner.source.calls(), 2);
    assert!(views.iter().all(|v| v.fetched_at == views[0].fetched_at));
}

#[tokio::test]
async fn aborting_the_leading_caller_does_not_restart_the_refresh() {
    let cache = Arc::new(SnapshotCache::with_clock(
        StubSource::with_delay(one_site_csv(), Duration::from_millis(200)),
        ManualClock::new(start()),
        ttl(),
    ));

    let leader = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.snapshot().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let follower = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.snapshot().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    leader.abort();

    let view = follower.await.expect("follower completes");
    assert_eq!(view.snapshot.counts.total, 1);
    assert!(!view.stale);
    assert_eq!(cache.inner.source.calls(), 1);
}

#[tokio::test]
async fn refresh_completes_after_every_caller_gives_up() {
    let cache = Arc::new(SnapshotCache::with_clock(
        StubSource::with_delay(one_site_csv(), Duration::from_millis(100)),
        ManualClock::new(start()),
        ttl(),
    ));

    let gave_up = tokio::time::timeout(Duration::from_millis(20), cache.snapshot()).await;
    assert!(gave_up.is_err(), "caller should time out before the fetch lands");

    tokio::time::sleep(Duration::from_millis(200)).await;
    let cached = cache.peek().await;
    assert_eq!(cached.snapshot.counts.total, 1);
    assert_eq!(cached.fetched_at, Some(start()));

    cache.snapshot().await;
    assert_eq!(cache.inner.source.calls(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_serving_previous_snapshot() {
    let cache = cache_with(StubSource::new(one_site_csv()));
    let before = cache.snapshot().await;

    cache.inner.source.set_failing(true);
    cache.inner.clock.advance(ttl());
    let after = cache.snapshot().await;

    assert_eq!(cache.inner.source.calls(), 2);
    assert!(Arc::ptr_eq(&before.snapshot, &after.snapshot));
    assert_eq!(after.snapshot.all_sites[0].site_name, "COW1");
    assert!(after.stale);
    assert_eq!(after.fetched_at, Some(start()));
    assert!(after
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("503")));
}

#[tokio::test]
async fn failure_is_retried_only_after_ttl() {
    let cache = cache_with(StubSource::new(one_site_csv()));
    cache.snapshot().await;
    cache.inner.source.set_failing(true);
    cache.inner.clock.advance(ttl());
    cache.snapshot().await;
    assert_eq!(cache.inner.source.calls(), 2);

    cache.inner.clock.advance(TimeDelta::seconds(30));
    cache.snapshot().await;
    assert_eq!(cache.inner.source.calls(), 2, "no retry inside the TTL window");

    cache.inner.source.set_failing(false);
    cache.inner.clock.advance(ttl());
    let recovered = cache.snapshot().await;
    assert_eq!(cache.inner.source.calls(), 3);
    assert!(!recovered.stale);
    assert!(recovered.last_error.is_none());
}

#[tokio::test]
async fn failure_without_previous_snapshot_yields_empty_stale_view() {
    let source = StubSource::new(String::new());
    source.set_failing(true);
    let cache = cache_with(source);

    let view = cache.snapshot().await;
    assert!(view.snapshot.is_empty());
    assert_eq!(view.snapshot.counts, SnapshotCounts::default());
    assert!(view.stale);
    assert!(view.fetched_at.is_none());
    assert!(view.last_error.is_some());
}

#[tokio::test]
async fn peek_never_fetches() {
    let cache = cache_with(StubSource::new(one_site_csv()));
    let view = cache.peek().await;
    assert!(view.snapshot.is_empty());
    assert!(view.stale);
    assert_eq!(cache.inner.source.calls(), 0);
}

#[tokio::test]
async fn accessors_read_from_the_same_snapshot() {
    let cache = cache_with(StubSource::new(sheet_csv(&[
        ("COW1", "Central Zone", "24.5", "46.7", "2026-10-17"),
        ("COW2", "East", "abc", "46.7", "2026-10-17"),
        ("COW3", "East", "26.4", "50.0", "2026-10-20"),
    ])));

    let due = cache.due_today().await;
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].site_name, "COW1");
    assert_eq!(cache.central_sites().await[0].site_name, "COW1");
    assert_eq!(cache.all_sites().await.len(), 2);
    let counts = cache.summary_counts().await;
    assert_eq!(counts.total, 2);
    assert_eq!(counts.due_today, 1);
    assert_eq!(cache.full_snapshot().await.due_tomorrow.len(), 0);
    assert_eq!(cache.inner.source.calls(), 1);
}

#[tokio::test]
async fn refresh_classifies_against_the_refresh_day() {
    let cache = cache_with(StubSource::new(sheet_csv(&[(
        "COW1", "East", "1", "2", "2026-10-18",
    )])));
    assert_eq!(cache.summary_counts().await.tomorrow, 1);

    // Next morning the same row is due today.
    cache.inner.clock.advance(TimeDelta::hours(24));
    let counts = cache.summary_counts().await;
    assert_eq!(counts.tomorrow, 0);
    assert_eq!(counts.due_today, 1);
}
