//! Gates serializing creation and teardown of a key.
//!
//! Under [`LockStrategy::PerKey`] every key gets its own async mutex, kept in
//! a registry only while someone holds a lease on it. Under
//! [`LockStrategy::Global`] every lease hands out the same mutex.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, MutexGuard};

use super::lock_unpoisoned;
use crate::domain::models::LockStrategy;

struct GateSlot {
    gate: Arc<Mutex<()>>,
    leases: usize,
}

pub(super) struct Gates<K> {
    strategy: LockStrategy,
    global: Arc<Mutex<()>>,
    slots: StdMutex<HashMap<K, GateSlot>>,
}

impl<K> Gates<K>
where
    K: Eq + Hash + Clone,
{
    pub(super) fn new(strategy: LockStrategy) -> Self {
        Self {
            strategy,
            global: Arc::new(Mutex::new(())),
            slots: StdMutex::new(HashMap::new()),
        }
    }

    /// Register interest in the gate for `key`. The gate stays in the
    /// registry until the last lease on it is dropped.
    pub(super) fn lease(&self, key: &K) -> GateLease<'_, K> {
        if self.strategy == LockStrategy::Global {
            return GateLease {
                gates: self,
                key: None,
                gate: Arc::clone(&self.global),
            };
        }

        let mut slots = lock_unpoisoned(&self.slots);
        let slot = slots.entry(key.clone()).or_insert_with(|| GateSlot {
            gate: Arc::new(Mutex::new(())),
            leases: 0,
        });
        slot.leases += 1;

        GateLease {
            gates: self,
            key: Some(key.clone()),
            gate: Arc::clone(&slot.gate),
        }
    }

    /// Number of per-key gates currently registered.
    #[cfg(test)]
    pub(super) fn registered(&self) -> usize {
        lock_unpoisoned(&self.slots).len()
    }

    fn return_lease(&self, key: &K) {
        let mut slots = lock_unpoisoned(&self.slots);
        if let Some(slot) = slots.get_mut(key) {
            slot.leases -= 1;
            if slot.leases == 0 {
                slots.remove(key);
            }
        }
    }
}

/// A registered claim on one gate. Dropping it unregisters the claim, so an
/// acquire future dropped mid-wait leaves nothing behind.
pub(super) struct GateLease<'a, K>
where
    K: Eq + Hash + Clone,
{
    gates: &'a Gates<K>,
    key: Option<K>,
    gate: Arc<Mutex<()>>,
}

impl<K> GateLease<'_, K>
where
    K: Eq + Hash + Clone,
{
    pub(super) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl<K> Drop for GateLease<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.gates.return_lease(&key);
        }
    }
}
