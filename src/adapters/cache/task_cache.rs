//! Process-local task cache.
//!
//! A plain id → record map behind a single `RwLock`. Reads share the lock;
//! every mutation, including the read-modify-write of a partial merge, runs
//! under the write guard so concurrent merges on one id cannot interleave.
//! The lock is synchronous: no operation here suspends, so a mirror that
//! follows a store confirmation can never be cut off half way by a cancelled
//! caller. No eviction and no persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::domain::models::{Task, TaskPatch, TaskQuery};

#[derive(Debug, Default)]
pub struct TaskCache {
    entries: RwLock<HashMap<i64, Task>>,
    /// Set once a full preload has completed; the map then mirrors the
    /// whole store and an empty filter result is a real answer.
    populated: AtomicBool,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.entries.read().get(&id).cloned()
    }

    /// Insert or overwrite unconditionally.
    pub fn put(&self, task: Task) {
        self.entries.write().insert(task.id, task);
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&self, id: i64) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    /// Every cached record, in no particular order.
    pub fn all(&self) -> Vec<Task> {
        self.entries.read().values().cloned().collect()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Records matching `query`, ordered by ascending id.
    pub fn filter(&self, query: &TaskQuery) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .entries
            .read()
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect();
        tasks.sort_unstable_by_key(|task| task.id);
        tasks
    }

    /// Overwrite an entry only if the id is already cached.
    /// Returns whether the entry was replaced.
    pub fn replace_if_present(&self, task: &Task) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(&task.id) {
            Some(entry) => {
                entry.clone_from(task);
                true
            }
            None => false,
        }
    }

    /// Apply the supplied fields of `patch` onto the cached entry for `id`.
    /// Returns the merged record, or `None` when the id is not cached.
    pub fn merge(&self, id: i64, patch: &TaskPatch) -> Option<Task> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&id)?;
        patch.apply_to(entry);
        Some(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry and forget that the cache was fully populated.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.populated.store(false, Ordering::SeqCst);
    }

    pub fn is_populated(&self) -> bool {
        self.populated.load(Ordering::SeqCst)
    }

    pub(crate) fn set_populated(&self, populated: bool) {
        self.populated.store(populated, Ordering::SeqCst);
    }
}
