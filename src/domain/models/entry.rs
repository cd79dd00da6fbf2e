//! Cache entry model.
//!
//! A [`CacheEntry`] is the sole owner of one resource instance. Tokens share
//! the entry to read the resource and to name the exact instance they
//! release; the usage count lives next to the entry in the cache state so it
//! is only ever touched under the state lock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// One cached resource instance.
#[derive(Debug)]
pub struct CacheEntry<R> {
    id: Uuid,
    resource: R,
    created_at: DateTime<Utc>,
    invalidated: AtomicBool,
}

impl<R> CacheEntry<R> {
    /// Wrap a freshly created resource.
    pub fn new(resource: R) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            created_at: Utc::now(),
            invalidated: AtomicBool::new(false),
        }
    }

    /// Unique identity of this instance.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// When the resource finished creation.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The resource, or `None` once the entry has been invalidated.
    pub fn resource(&self) -> Option<&R> {
        if self.is_invalidated() {
            None
        } else {
            Some(&self.resource)
        }
    }

    /// The resource regardless of validity. Only the cache uses this, to
    /// dispose an instance it has already detached.
    pub(crate) const fn owned_resource(&self) -> &R {
        &self.resource
    }

    /// Whether a reset or the last release has detached the entry.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Detach the entry from future use. Called under the cache state lock.
    pub(crate) fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }
}

/// Point-in-time view of one active cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySnapshot<K> {
    pub key: K,
    pub entry_id: Uuid,
    pub usage_count: usize,
    pub created_at: DateTime<Utc>,
}
