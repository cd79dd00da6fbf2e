//! Common test utilities for integration tests
//!
//! Provides a tracked resource whose creations and disposals are counted per
//! key, plus logging and polling helpers shared across test files.

use async_trait::async_trait;
use shared_resource::{AsyncDispose, CacheConfig, SharedResourceCache};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-key counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyStats {
    pub created: usize,
    pub disposed: usize,
    pub live: usize,
    pub max_live: usize,
}

/// Records every creation and disposal made through [`TrackedResource`].
#[derive(Debug, Default)]
pub struct Tracker {
    stats: Mutex<HashMap<String, KeyStats>>,
    creation_attempts: AtomicUsize,
    fail_creations: AtomicUsize,
    fail_dispose: AtomicBool,
    double_disposals: AtomicUsize,
}

#[allow(dead_code)]
impl Tracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `n` creations fail.
    pub fn fail_next_creations(&self, n: usize) {
        self.fail_creations.store(n, Ordering::SeqCst);
    }

    pub fn fail_disposals(&self, fail: bool) {
        self.fail_dispose.store(fail, Ordering::SeqCst);
    }

    pub fn creation_attempts(&self) -> usize {
        self.creation_attempts.load(Ordering::SeqCst)
    }

    pub fn double_disposals(&self) -> usize {
        self.double_disposals.load(Ordering::SeqCst)
    }

    pub fn stats(&self, key: &str) -> KeyStats {
        self.stats
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    pub fn all_stats(&self) -> HashMap<String, KeyStats> {
        self.stats.lock().unwrap().clone()
    }

    pub fn total_created(&self) -> usize {
        self.all_stats().values().map(|s| s.created).sum()
    }

    pub fn total_disposed(&self) -> usize {
        self.all_stats().values().map(|s| s.disposed).sum()
    }

    /// Build a resource for `key`, honoring injected creation failures.
    pub fn create(self: &Arc<Self>, key: &str) -> anyhow::Result<TrackedResource> {
        self.creation_attempts.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .fail_creations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            anyhow::bail!("injected creation failure for {key}");
        }

        let mut stats = self.stats.lock().unwrap();
        let entry = stats.entry(key.to_string()).or_default();
        entry.created += 1;
        entry.live += 1;
        entry.max_live = entry.max_live.max(entry.live);
        let serial = entry.created;
        drop(stats);

        Ok(TrackedResource {
            key: key.to_string(),
            serial,
            tracker: Arc::clone(self),
            disposed: AtomicBool::new(false),
        })
    }

    fn record_dispose(&self, key: &str) {
        let mut stats = self.stats.lock().unwrap();
        let entry = stats.entry(key.to_string()).or_default();
        entry.disposed += 1;
        entry.live = entry.live.saturating_sub(1);
    }
}

/// A resource that reports its lifecycle to a [`Tracker`].
#[derive(Debug)]
pub struct TrackedResource {
    pub key: String,
    /// 1 for the first instance created for the key, 2 for the second, ...
    pub serial: usize,
    tracker: Arc<Tracker>,
    disposed: AtomicBool,
}

#[async_trait]
impl AsyncDispose for TrackedResource {
    async fn dispose(&self) -> anyhow::Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            self.tracker.double_disposals.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }

        self.tracker.record_dispose(&self.key);
        if self.tracker.fail_dispose.load(Ordering::SeqCst) {
            anyhow::bail!("injected disposal failure for {}", self.key);
        }
        Ok(())
    }
}

/// A keyed cache whose creator sleeps for `delay` before building a tracked resource.
#[allow(dead_code)]
pub fn tracked_cache(
    tracker: &Arc<Tracker>,
    delay: Duration,
    config: CacheConfig,
) -> SharedResourceCache<String, TrackedResource> {
    let tracker = Arc::clone(tracker);
    SharedResourceCache::with_config(
        move |key: String, _cancel| {
            let tracker = Arc::clone(&tracker);
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                tracker.create(&key)
            }
        },
        config,
    )
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 10ms until it returns true or timeout is reached.
#[allow(dead_code)]
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    predicate()
}
