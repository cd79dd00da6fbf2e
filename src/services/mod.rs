pub mod resource_factory;
pub mod shared_resource;

pub use resource_factory::SharedResourceFactory;
pub use shared_resource::{
    CreateFuture, ResourceToken, SharedResource, SharedResourceCache, SingleResourceToken,
};
