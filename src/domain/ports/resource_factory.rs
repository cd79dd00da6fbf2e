//! Factory ports for creating raw, uninitialized resources.
//!
//! The four shapes differ only in what they receive at the call site. All of
//! them are reduced to the cache's single creator callback by
//! [`SharedResourceFactory`](crate::services::SharedResourceFactory).

use super::resource::Resource;

/// Factory taking no arguments.
pub trait ResourceFactory: Send + Sync + 'static {
    /// The resource type produced.
    type Resource: Resource;

    /// Construct a new, uninitialized resource.
    fn create(&self) -> Self::Resource;
}

/// Factory taking the key the resource was requested for.
pub trait KeyedResourceFactory<K>: Send + Sync + 'static {
    /// The resource type produced.
    type Resource: Resource;

    /// Construct a new, uninitialized resource for `key`.
    fn create(&self, key: &K) -> Self::Resource;
}

/// Factory taking a fixed construction parameter.
pub trait ResourceFactoryWithParam<P>: Send + Sync + 'static {
    /// The resource type produced.
    type Resource: Resource;

    /// Construct a new, uninitialized resource from `param`.
    fn create(&self, param: &P) -> Self::Resource;
}

/// Factory taking both the key and a fixed construction parameter.
pub trait KeyedResourceFactoryWithParam<K, P>: Send + Sync + 'static {
    /// The resource type produced.
    type Resource: Resource;

    /// Construct a new, uninitialized resource for `key` from `param`.
    fn create(&self, key: &K, param: &P) -> Self::Resource;
}
