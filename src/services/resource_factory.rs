//! Builds shared resource caches from resource factories.
//!
//! Every factory shape is reduced to the same creator: construct the raw
//! resource, then run [`Resource::initialize`] once before it is cached. A
//! resource whose initialization fails counts as never created: it is not
//! cached and not disposed.

use anyhow::Context;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::models::CacheConfig;
use crate::domain::ports::{
    KeyedResourceFactory, KeyedResourceFactoryWithParam, Resource, ResourceFactory,
    ResourceFactoryWithParam,
};
use crate::services::shared_resource::{SharedResource, SharedResourceCache};

/// Creates [`SharedResource`]s and [`SharedResourceCache`]s from factories.
#[derive(Debug, Clone, Default)]
pub struct SharedResourceFactory {
    config: CacheConfig,
}

impl SharedResourceFactory {
    /// Factory building caches with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cache built by this factory uses `config`.
    pub const fn with_config(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Share the resource produced by a zero-argument factory.
    pub fn create<F>(&self, factory: F) -> SharedResource<F::Resource>
    where
        F: ResourceFactory,
    {
        let factory = Arc::new(factory);
        SharedResource::with_config(
            move |token| {
                let factory = Arc::clone(&factory);
                async move { initialize(factory.create(), token).await }
            },
            self.config.clone(),
        )
    }

    /// Share the resource produced from `param`.
    pub fn create_with_param<F, P>(&self, factory: F, param: P) -> SharedResource<F::Resource>
    where
        F: ResourceFactoryWithParam<P>,
        P: Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        let param = Arc::new(param);
        SharedResource::with_config(
            move |token| {
                let factory = Arc::clone(&factory);
                let param = Arc::clone(&param);
                async move { initialize(factory.create(&param), token).await }
            },
            self.config.clone(),
        )
    }

    /// Share one resource per key.
    pub fn create_keyed<F, K>(&self, factory: F) -> SharedResourceCache<K, F::Resource>
    where
        F: KeyedResourceFactory<K>,
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        SharedResourceCache::with_config(
            move |key: K, token| {
                let factory = Arc::clone(&factory);
                async move { initialize(factory.create(&key), token).await }
            },
            self.config.clone(),
        )
    }

    /// Share one resource per key, each built from `param`.
    pub fn create_keyed_with_param<F, K, P>(
        &self,
        factory: F,
        param: P,
    ) -> SharedResourceCache<K, F::Resource>
    where
        F: KeyedResourceFactoryWithParam<K, P>,
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        P: Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        let param = Arc::new(param);
        SharedResourceCache::with_config(
            move |key: K, token| {
                let factory = Arc::clone(&factory);
                let param = Arc::clone(&param);
                async move { initialize(factory.create(&key, &param), token).await }
            },
            self.config.clone(),
        )
    }
}

/// Run the one-time initialization of a freshly constructed resource.
async fn initialize<R: Resource>(
    mut resource: R,
    cancellation_token: CancellationToken,
) -> anyhow::Result<R> {
    resource
        .initialize(cancellation_token)
        .await
        .context("resource initialization failed")?;

    debug!("resource initialized");
    Ok(resource)
}
