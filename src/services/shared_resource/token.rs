//! Tokens handed out by the shared resource cache.

use async_trait::async_trait;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use super::cache::Inner;
use crate::domain::errors::{SharedResourceError, SharedResourceResult};
use crate::domain::models::CacheEntry;
use crate::domain::ports::{AsyncDispose, ResourceHandle};

/// One unit of usage of a shared resource.
///
/// The token does not own the resource; the cache does. Releasing the token
/// (explicitly with [`release`](Self::release), or by dropping it inside a
/// tokio runtime) gives the unit back, and the last release disposes the
/// resource. Only the first release has an effect.
///
/// A token dropped while its runtime is shutting down may lose the spawned
/// release; release explicitly before shutdown to be sure the resource is
/// disposed.
pub struct ResourceToken<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    key: K,
    entry: Arc<CacheEntry<R>>,
    /// Back-reference used to release; `None` once released.
    cache: Option<Arc<Inner<K, R>>>,
}

impl<K, R> ResourceToken<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    pub(super) fn new(key: K, entry: Arc<CacheEntry<R>>, cache: Arc<Inner<K, R>>) -> Self {
        Self {
            key,
            entry,
            cache: Some(cache),
        }
    }

    /// The key this token was acquired for.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Identity of the cached instance this token refers to.
    pub fn entry_id(&self) -> Uuid {
        self.entry.id()
    }

    /// The shared resource.
    ///
    /// Fails with [`SharedResourceError::ReleasedToken`] once this token has
    /// been released, and with [`SharedResourceError::InvalidatedToken`] once
    /// a reset has detached the instance.
    pub fn resource(&self) -> SharedResourceResult<&R> {
        if self.is_released() {
            return Err(SharedResourceError::ReleasedToken {
                key: format!("{:?}", self.key),
            });
        }
        self.entry
            .resource()
            .ok_or_else(|| SharedResourceError::InvalidatedToken {
                key: format!("{:?}", self.key),
            })
    }

    /// Whether the token still refers to a live cache entry.
    pub fn is_valid(&self) -> bool {
        !self.entry.is_invalidated()
    }

    /// Whether [`release`](Self::release) has already run.
    pub fn is_released(&self) -> bool {
        self.cache.is_none()
    }

    /// Give back this token's unit of usage.
    ///
    /// The bookkeeping runs in a spawned task, so dropping this future
    /// cannot lose the decrement. Disposal failures of the last release are
    /// returned here. Calling it again is a no-op.
    pub async fn release(&mut self) -> SharedResourceResult<()> {
        let Some(cache) = self.cache.take() else {
            return Ok(());
        };

        let task = tokio::spawn(cache.release(self.key.clone(), Arc::clone(&self.entry)));
        task.await.map_err(|join_error| {
            error!(key = ?self.key, error = %join_error, "release task aborted");
            SharedResourceError::ReleaseAborted {
                key: format!("{:?}", self.key),
            }
        })?
    }
}

impl<K, R> Drop for ResourceToken<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    fn drop(&mut self) {
        let Some(cache) = self.cache.take() else {
            return;
        };
        if self.entry.is_invalidated() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let key = self.key.clone();
                let entry = Arc::clone(&self.entry);
                runtime.spawn(async move {
                    if let Err(err) = cache.release(key, entry).await {
                        warn!(error = %err, "background release failed");
                    }
                });
            }
            Err(_) => {
                warn!(
                    key = ?self.key,
                    entry_id = %self.entry.id(),
                    "token dropped outside a tokio runtime, resource stays in use"
                );
            }
        }
    }
}

impl<K, R> Debug for ResourceToken<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceToken")
            .field("key", &self.key)
            .field("entry_id", &self.entry.id())
            .field("valid", &self.is_valid())
            .field("released", &self.is_released())
            .finish()
    }
}

#[async_trait]
impl<K, R> ResourceHandle<R> for ResourceToken<K, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    R: AsyncDispose,
{
    fn resource(&self) -> SharedResourceResult<&R> {
        Self::resource(self)
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }

    async fn release(&mut self) -> SharedResourceResult<()> {
        Self::release(self).await
    }
}
