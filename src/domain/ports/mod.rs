//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces at the cache's boundaries:
//! - AsyncDispose / Resource: implemented by the types being shared
//! - Resource factories: the four construction shapes callers supply
//! - Providers / ResourceHandle: what consumers depend on to acquire resources

pub mod resource;
pub mod resource_factory;
pub mod shared_resource;

pub use resource::{AsyncDispose, Resource};
pub use resource_factory::{
    KeyedResourceFactory, KeyedResourceFactoryWithParam, ResourceFactory,
    ResourceFactoryWithParam,
};
pub use shared_resource::{KeyedResourceProvider, ResourceHandle, ResourceProvider};
