//! Single shared resource, cached under an implicit key.

use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use super::cache::SharedResourceCache;
use super::token::ResourceToken;
use crate::domain::errors::SharedResourceResult;
use crate::domain::models::CacheConfig;
use crate::domain::ports::{AsyncDispose, ResourceProvider};

/// Token returned by [`SharedResource`].
pub type SingleResourceToken<R> = ResourceToken<(), R>;

/// One resource shared by every consumer.
///
/// Same semantics as [`SharedResourceCache`] with exactly one key.
pub struct SharedResource<R: AsyncDispose> {
    cache: SharedResourceCache<(), R>,
}

impl<R: AsyncDispose> Clone for SharedResource<R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<R: AsyncDispose> SharedResource<R> {
    /// Create a shared resource with the default configuration.
    pub fn new<F, Fut>(create: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Self::with_config(create, CacheConfig::default())
    }

    /// Create a shared resource with an explicit configuration.
    pub fn with_config<F, Fut>(create: F, config: CacheConfig) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Self {
            cache: SharedResourceCache::with_config(move |(), token| create(token), config),
        }
    }

    /// Get a token for the resource, creating it if there is none.
    pub async fn acquire(
        &self,
        cancellation_token: &CancellationToken,
    ) -> SharedResourceResult<SingleResourceToken<R>> {
        self.cache.acquire((), cancellation_token).await
    }

    /// Detach the resource; see [`SharedResourceCache::reset`].
    pub async fn reset(&self, dispose_resources: bool) -> SharedResourceResult<()> {
        self.cache.reset(dispose_resources).await
    }

    /// Whether an instance currently exists.
    pub fn is_active(&self) -> bool {
        !self.cache.is_empty()
    }

    /// Outstanding tokens; zero when there is no instance.
    pub fn usage_count(&self) -> usize {
        self.cache.usage_count(&())
    }
}

#[async_trait]
impl<R: AsyncDispose> ResourceProvider<R> for SharedResource<R> {
    type Handle = SingleResourceToken<R>;

    async fn acquire(
        &self,
        cancellation_token: &CancellationToken,
    ) -> SharedResourceResult<Self::Handle> {
        Self::acquire(self, cancellation_token).await
    }

    async fn reset(&self, dispose_resources: bool) -> SharedResourceResult<()> {
        Self::reset(self, dispose_resources).await
    }
}
