//! Per-id write serialization.
//!
//! Writers of the same task id take turns for the whole store-call-plus-
//! mirror sequence, so mirrors reach the cache in the order the store
//! committed them. Writers of different ids never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, Weak};

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct WriteGate {
    slots: std::sync::Mutex<HashMap<i64, Weak<Mutex<()>>>>,
}

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `id`. Access ends when the guard drops.
    pub async fn lock(&self, id: i64) -> OwnedMutexGuard<()> {
        self.slot(id).lock_owned().await
    }

    fn slot(&self, id: i64) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slots.get(&id).and_then(Weak::upgrade) {
            return existing;
        }
        // Slots whose guards have all dropped are dead weight.
        slots.retain(|_, slot| slot.strong_count() > 0);
        let slot = Arc::new(Mutex::new(()));
        slots.insert(id, Arc::downgrade(&slot));
        slot
    }

    /// Number of ids with a live slot.
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}
