//! Resource port - contracts implemented by the types being shared.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Asynchronous teardown of a cached resource.
///
/// The cache calls [`dispose`](Self::dispose) exactly once per instance,
/// either when the last token is released or during a reset. Any resource
/// the cache owns must implement this.
#[async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Release everything the resource holds (connections, files, tasks).
    async fn dispose(&self) -> anyhow::Result<()>;
}

/// A resource that is created raw by a factory and then initialized.
///
/// Factories only construct; [`initialize`](Self::initialize) performs the
/// expensive async setup and runs exactly once, before any token for the
/// instance is handed out. If it fails the instance is never cached.
#[async_trait]
pub trait Resource: AsyncDispose {
    /// Bring the resource into a usable state.
    async fn initialize(&mut self, cancellation_token: CancellationToken) -> anyhow::Result<()>;
}
