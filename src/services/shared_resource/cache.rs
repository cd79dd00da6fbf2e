//! Keyed, reference-counted cache of shared resources.
//!
//! The first [`acquire`](SharedResourceCache::acquire) for a key runs the
//! creator; later acquires for the same key get a token to the same
//! instance. The instance is disposed when its last token is released, or
//! when [`reset`](SharedResourceCache::reset) detaches everything.
//!
//! Three locks cooperate:
//! - the state lock (`std::sync::Mutex`) guards the entry map and every usage
//!   count, and is never held across an await;
//! - the key's gate serializes creation and teardown of that key, so no key
//!   ever has two live instances;
//! - the reset barrier keeps creators out while a reset drains and disposes.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::gates::Gates;
use super::lock_unpoisoned;
use super::token::ResourceToken;
use crate::domain::errors::{SharedResourceError, SharedResourceResult};
use crate::domain::models::{CacheConfig, CacheEntry, EntrySnapshot};
use crate::domain::ports::{AsyncDispose, KeyedResourceProvider};

/// Future returned by a creator callback.
pub type CreateFuture<R> = BoxFuture<'static, anyhow::Result<R>>;

type Creator<K, R> = Box<dyn Fn(K, CancellationToken) -> CreateFuture<R> + Send + Sync>;

/// An entry together with its usage count.
struct Slot<R> {
    entry: Arc<CacheEntry<R>>,
    usage_count: usize,
}

pub(super) struct Inner<K, R> {
    entries: StdMutex<HashMap<K, Slot<R>>>,
    gates: Gates<K>,
    reset_barrier: RwLock<()>,
    creator: Creator<K, R>,
    config: CacheConfig,
}

/// Thread-safe cache sharing one resource instance per key.
///
/// Cloning the cache is cheap; clones share the same entries.
pub struct SharedResourceCache<K, R> {
    inner: Arc<Inner<K, R>>,
}

impl<K, R> Clone for SharedResourceCache<K, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, R> SharedResourceCache<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    /// Create a cache with the default configuration.
    ///
    /// `create` builds a ready-to-use resource for a key. It must not acquire
    /// from this same cache.
    pub fn new<F, Fut>(create: F) -> Self
    where
        F: Fn(K, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Self::with_config(create, CacheConfig::default())
    }

    /// Create a cache with an explicit configuration.
    pub fn with_config<F, Fut>(create: F, config: CacheConfig) -> Self
    where
        F: Fn(K, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let creator: Creator<K, R> = Box::new(move |key, token| Box::pin(create(key, token)));

        Self {
            inner: Arc::new(Inner {
                entries: StdMutex::new(HashMap::new()),
                gates: Gates::new(config.lock_strategy),
                reset_barrier: RwLock::new(()),
                creator,
                config,
            }),
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Get a token for the resource of `key`, creating the resource if
    /// there is no active one.
    ///
    /// Concurrent calls for a key that is being created wait for that
    /// creation instead of starting another. If creation fails, times out or
    /// is cancelled, nothing is cached and the next call tries again.
    #[instrument(skip_all, fields(key = ?key))]
    pub async fn acquire(
        &self,
        key: K,
        cancellation_token: &CancellationToken,
    ) -> SharedResourceResult<ResourceToken<K, R>> {
        if cancellation_token.is_cancelled() {
            return Err(cancelled(&key));
        }

        if let Some(token) = self.reuse(&key) {
            return Ok(token);
        }

        let _barrier = tokio::select! {
            biased;
            () = cancellation_token.cancelled() => return Err(cancelled(&key)),
            guard = self.inner.reset_barrier.read() => guard,
        };

        let lease = self.inner.gates.lease(&key);
        let _gate = tokio::select! {
            biased;
            () = cancellation_token.cancelled() => return Err(cancelled(&key)),
            guard = lease.lock() => guard,
        };

        // Someone else may have created it while we waited for the gate.
        if let Some(token) = self.reuse(&key) {
            return Ok(token);
        }

        let resource = self.create(key.clone(), cancellation_token).await?;
        let entry = Arc::new(CacheEntry::new(resource));

        {
            let mut entries = lock_unpoisoned(&self.inner.entries);
            let previous = entries.insert(
                key.clone(),
                Slot {
                    entry: Arc::clone(&entry),
                    usage_count: 1,
                },
            );
            debug_assert!(previous.is_none(), "gate held, no entry may exist");
        }

        info!(entry_id = %entry.id(), "shared resource created");
        Ok(ResourceToken::new(key, entry, Arc::clone(&self.inner)))
    }

    /// Detach every active resource.
    ///
    /// Waits for in-flight creations, then removes all entries and marks
    /// them invalidated: tokens handed out earlier report invalid, refuse
    /// access to the resource and release as a no-op. With
    /// `dispose_resources`, every detached resource is disposed; failures do
    /// not stop the remaining disposals and are returned together.
    #[instrument(skip(self))]
    pub async fn reset(&self, dispose_resources: bool) -> SharedResourceResult<()> {
        let _barrier = self.inner.reset_barrier.write().await;

        let drained: Vec<(K, Arc<CacheEntry<R>>)> = {
            let mut entries = lock_unpoisoned(&self.inner.entries);
            entries
                .drain()
                .map(|(key, slot)| {
                    slot.entry.invalidate();
                    (key, slot.entry)
                })
                .collect()
        };

        info!(
            detached = drained.len(),
            dispose_resources, "shared resources reset"
        );

        if !dispose_resources {
            return Ok(());
        }

        let mut failures = Vec::new();
        for (key, entry) in drained {
            if let Err(err) = dispose_entry(&key, &entry).await {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SharedResourceError::ResetFailed(failures))
        }
    }

    /// Number of keys with an active resource.
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.inner.entries).len()
    }

    /// Whether no key has an active resource.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` has an active resource.
    pub fn contains_key(&self, key: &K) -> bool {
        lock_unpoisoned(&self.inner.entries).contains_key(key)
    }

    /// Outstanding tokens for `key`; zero when there is no active resource.
    pub fn usage_count(&self, key: &K) -> usize {
        lock_unpoisoned(&self.inner.entries)
            .get(key)
            .map_or(0, |slot| slot.usage_count)
    }

    /// Point-in-time view of every active entry.
    pub fn snapshot(&self) -> Vec<EntrySnapshot<K>> {
        lock_unpoisoned(&self.inner.entries)
            .iter()
            .map(|(key, slot)| EntrySnapshot {
                key: key.clone(),
                entry_id: slot.entry.id(),
                usage_count: slot.usage_count,
                created_at: slot.entry.created_at(),
            })
            .collect()
    }

    /// Number of per-key gates currently registered.
    #[cfg(test)]
    pub(crate) fn registered_gates(&self) -> usize {
        self.inner.gates.registered()
    }

    /// Hand out another token for an active entry, if there is one.
    fn reuse(&self, key: &K) -> Option<ResourceToken<K, R>> {
        let entry = {
            let mut entries = lock_unpoisoned(&self.inner.entries);
            let slot = entries.get_mut(key)?;
            slot.usage_count += 1;
            debug!(
                entry_id = %slot.entry.id(),
                usage_count = slot.usage_count,
                "reusing shared resource"
            );
            Arc::clone(&slot.entry)
        };

        Some(ResourceToken::new(key.clone(), entry, Arc::clone(&self.inner)))
    }

    async fn create(
        &self,
        key: K,
        cancellation_token: &CancellationToken,
    ) -> SharedResourceResult<R> {
        let key_repr = format!("{key:?}");
        let creation = (self.inner.creator)(key, cancellation_token.clone());
        let timeout_ms = self.inner.config.creation_timeout_ms;

        let bounded = async move {
            match timeout_ms {
                Some(ms) => tokio::time::timeout(Duration::from_millis(ms), creation)
                    .await
                    .map_err(|_| ms),
                None => Ok(creation.await),
            }
        };

        let outcome = tokio::select! {
            biased;
            () = cancellation_token.cancelled() => {
                debug!(key = %key_repr, "creation cancelled");
                return Err(SharedResourceError::Cancelled { key: key_repr });
            }
            outcome = bounded => outcome,
        };

        match outcome {
            Ok(Ok(resource)) => Ok(resource),
            Ok(Err(source)) => {
                warn!(key = %key_repr, error = %source, "shared resource creation failed");
                Err(SharedResourceError::CreationFailed {
                    key: key_repr,
                    source,
                })
            }
            Err(timeout_ms) => {
                warn!(key = %key_repr, timeout_ms, "shared resource creation timed out");
                Err(SharedResourceError::CreationTimedOut {
                    key: key_repr,
                    timeout_ms,
                })
            }
        }
    }
}

impl<K, R> Inner<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    /// Give back one unit of usage of `entry`, disposing it on the last one.
    ///
    /// Runs with the key's gate held so a new instance for the key cannot be
    /// created until the old one is fully disposed.
    pub(super) async fn release(
        self: Arc<Self>,
        key: K,
        entry: Arc<CacheEntry<R>>,
    ) -> SharedResourceResult<()> {
        if entry.is_invalidated() {
            debug!(key = ?key, entry_id = %entry.id(), "release of detached resource ignored");
            return Ok(());
        }

        let lease = self.gates.lease(&key);
        let _gate = lease.lock().await;

        let detached = {
            let mut entries = lock_unpoisoned(&self.entries);

            // A reset may have detached the entry while we waited.
            if entry.is_invalidated() {
                debug!(key = ?key, entry_id = %entry.id(), "release of detached resource ignored");
                return Ok(());
            }

            match entries.get_mut(&key) {
                Some(slot) if slot.entry.id() == entry.id() => {
                    slot.usage_count -= 1;
                    debug!(
                        key = ?key,
                        entry_id = %entry.id(),
                        usage_count = slot.usage_count,
                        "shared resource released"
                    );
                    if slot.usage_count == 0 {
                        entries.remove(&key).map(|slot| {
                            slot.entry.invalidate();
                            slot.entry
                        })
                    } else {
                        None
                    }
                }
                _ => {
                    error!(
                        key = ?key,
                        entry_id = %entry.id(),
                        "live token has no matching cache entry"
                    );
                    return Err(SharedResourceError::UnknownEntry {
                        key: format!("{key:?}"),
                    });
                }
            }
        };

        match detached {
            Some(entry) => dispose_entry(&key, &entry).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<K, R> KeyedResourceProvider<K, R> for SharedResourceCache<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    type Handle = ResourceToken<K, R>;

    async fn acquire(
        &self,
        key: K,
        cancellation_token: &CancellationToken,
    ) -> SharedResourceResult<Self::Handle> {
        Self::acquire(self, key, cancellation_token).await
    }

    async fn reset(&self, dispose_resources: bool) -> SharedResourceResult<()> {
        Self::reset(self, dispose_resources).await
    }
}

async fn dispose_entry<K, R>(key: &K, entry: &CacheEntry<R>) -> SharedResourceResult<()>
where
    K: Debug,
    R: AsyncDispose,
{
    match entry.owned_resource().dispose().await {
        Ok(()) => {
            info!(key = ?key, entry_id = %entry.id(), "shared resource disposed");
            Ok(())
        }
        Err(source) => {
            warn!(
                key = ?key,
                entry_id = %entry.id(),
                error = %source,
                "shared resource disposal failed"
            );
            Err(SharedResourceError::DisposalFailed {
                key: format!("{key:?}"),
                source,
            })
        }
    }
}

fn cancelled<K: Debug>(key: &K) -> SharedResourceError {
    SharedResourceError::Cancelled {
        key: format!("{key:?}"),
    }
}
