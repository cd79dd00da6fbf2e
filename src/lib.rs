//! Shared Resource - reference-counted sharing of async resources
//!
//! Expensive resources (connections, clients, sessions) are created once per
//! key, shared by every concurrent consumer, and disposed when the last
//! consumer releases its token.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): entry and configuration models, errors, and
//!   the ports resources, factories and consumers depend on
//! - **Service Layer** (`services`): the keyed cache, its tokens, the
//!   single-resource wrapper and the factory adapters
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and
//!   logging setup
//!
//! # Example
//!
//! ```no_run
//! use shared_resource::{AsyncDispose, SharedResourceCache};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Connection;
//!
//! #[async_trait::async_trait]
//! impl AsyncDispose for Connection {
//!     async fn dispose(&self) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = SharedResourceCache::new(|_host: String, _cancel| async { Ok(Connection) });
//! let cancel = CancellationToken::new();
//!
//! let mut token = cache.acquire("db".to_string(), &cancel).await?;
//! let _connection = token.resource()?;
//! token.release().await?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{CacheConfig, Config, EntrySnapshot, LockStrategy, LoggingConfig};
pub use domain::ports::{
    AsyncDispose, KeyedResourceFactory, KeyedResourceFactoryWithParam, KeyedResourceProvider,
    Resource, ResourceFactory, ResourceFactoryWithParam, ResourceHandle, ResourceProvider,
};
pub use domain::{SharedResourceError, SharedResourceResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::{LogConfig, LoggerImpl};
pub use services::{
    ResourceToken, SharedResource, SharedResourceCache, SharedResourceFactory,
    SingleResourceToken,
};
