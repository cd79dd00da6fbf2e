//! Shared resource ports - what consumers depend on instead of the concrete cache.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::SharedResourceResult;

/// A releasable reference to a shared resource.
#[async_trait]
pub trait ResourceHandle<R>: Send {
    /// The shared resource, or an error once the handle was released or
    /// invalidated by a reset.
    fn resource(&self) -> SharedResourceResult<&R>;

    /// Whether the handle still refers to a live cache entry.
    fn is_valid(&self) -> bool;

    /// Give back this handle's unit of usage. Only the first call has an effect.
    async fn release(&mut self) -> SharedResourceResult<()>;
}

/// Thread-safe access to resources shared per key.
///
/// The returned handle must be released for the resource to be disposed
/// once it is no longer used.
#[async_trait]
pub trait KeyedResourceProvider<K, R>: Send + Sync {
    /// Handle type returned by [`acquire`](Self::acquire).
    type Handle: ResourceHandle<R>;

    /// Get a handle to the resource for `key`, creating it if there is none.
    async fn acquire(
        &self,
        key: K,
        cancellation_token: &CancellationToken,
    ) -> SharedResourceResult<Self::Handle>;

    /// Detach every resource; the next acquire creates a new one.
    /// Releasing previously returned handles has no effect afterwards.
    async fn reset(&self, dispose_resources: bool) -> SharedResourceResult<()>;
}

/// Thread-safe access to a single shared resource.
#[async_trait]
pub trait ResourceProvider<R>: Send + Sync {
    /// Handle type returned by [`acquire`](Self::acquire).
    type Handle: ResourceHandle<R>;

    /// Get a handle to the resource, creating it if there is none.
    async fn acquire(&self, cancellation_token: &CancellationToken)
        -> SharedResourceResult<Self::Handle>;

    /// Detach the resource; the next acquire creates a new one.
    async fn reset(&self, dispose_resources: bool) -> SharedResourceResult<()>;
}
