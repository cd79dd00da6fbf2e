//! Reference-counted sharing of disposable resources.

mod cache;
mod gates;
mod single;
mod token;

pub use cache::{CreateFuture, SharedResourceCache};
pub use single::{SharedResource, SingleResourceToken};
pub use token::ResourceToken;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a state mutex, recovering from poisoning. Every critical section in
/// this module leaves its state consistent before it can panic.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
