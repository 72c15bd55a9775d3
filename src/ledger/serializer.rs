//! Per-key mutual exclusion.
//!
//! Every key maps to one execution slot. A holder keeps its slot until the
//! returned guard is dropped, so release happens on every exit path. Slots
//! are created on first use and dropped from the map when nobody holds or
//! waits for them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as SlotMutex, OwnedMutexGuard};

type Slots<K> = Arc<Mutex<HashMap<K, Arc<SlotMutex<()>>>>>;

fn lock_slots<K>(slots: &Slots<K>) -> MutexGuard<'_, HashMap<K, Arc<SlotMutex<()>>>> {
    // The map is only touched in short, panic-free sections.
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct KeyedSerializer<K> {
    slots: Slots<K>,
}

impl<K> Default for KeyedSerializer<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> KeyedSerializer<K>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `key`
    pub async fn acquire(&self, key: K) -> SlotGuard<K> {
        let slot = {
            let mut slots = lock_slots(&self.slots);
            slots.entry(key).or_default().clone()
        };

        let guard = slot.lock_owned().await;
        SlotGuard {
            key,
            slots: self.slots.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited
    pub fn active_slots(&self) -> usize {
        lock_slots(&self.slots).len()
    }
}

/// Exclusive hold on one key's slot
#[derive(Debug)]
pub struct SlotGuard<K>
where
    K: Eq + Hash + Copy,
{
    key: K,
    slots: Slots<K>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for SlotGuard<K>
where
    K: Eq + Hash + Copy,
{
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        // New waiters clone the slot only under the map lock, so the count
        // cannot grow while it is held here.
        let mut slots = lock_slots(&self.slots);
        let slot = OwnedMutexGuard::mutex(&guard);
        if Arc::strong_count(slot) == 2 {
            slots.remove(&self.key);
        }
        drop(guard);
    }
}
