//! Advisory per-entity locking: process-local, best-effort serialization of
//! writes to the same entity within one process, reentrant for nested
//! recursion inside a single tool call (a cascade apply pass re-entering the
//! feature it just wrote). Not a distributed transaction mechanism. Shaped
//! after an `Arc<parking_lot::Mutex<..>>` registry pattern, generalized to a
//! keyed set of per-entity async locks.

use crate::models::ContainerType;
use parking_lot::Mutex as SyncMutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

pub type LockKey = (ContainerType, Uuid);

/// Tracks which keys the current call chain already holds, so nested
/// recursion (cascade applying a child, then recursing into it) does not
/// deadlock against itself.
#[derive(Debug, Default, Clone)]
pub struct HeldLocks(HashSet<LockKey>);

impl HeldLocks {
    pub fn new() -> Self {
        Self::default()
    }
}

enum Held {
    /// This call acquired the lock and must release it on drop.
    Acquired(LockKey, Arc<LockRegistryInner>, OwnedMutexGuard<()>),
    /// The current call chain already held this key; nothing to release.
    Reentrant,
}

/// A guard returned by [`LockRegistry::acquire`]. Dropping it releases the
/// lock (if this call was the one that acquired it).
pub struct LockGuard {
    key: LockKey,
    held: Held,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Held::Acquired(key, registry, _guard) = &self.held {
            registry.locks.lock().remove(key);
            let _ = key;
        }
    }
}

struct LockRegistryInner {
    locks: SyncMutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

/// Process-wide registry of per-entity advisory locks.
#[derive(Clone)]
pub struct LockRegistry {
    inner: Arc<LockRegistryInner>,
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self { inner: Arc::new(LockRegistryInner { locks: SyncMutex::new(HashMap::new()) }) }
    }

    /// Acquires the advisory lock for `key`, or is a no-op if `already_held`
    /// (the caller's own reentrancy set) already contains it — the caller is
    /// responsible for threading `already_held` through recursive calls and
    /// inserting the key into it once acquired (see
    /// [`HeldLocks::new`]/`tools::manage_container`'s cascade recursion).
    pub async fn acquire(&self, key: LockKey, already_held: &HeldLocks) -> LockGuard {
        if already_held.0.contains(&key) {
            return LockGuard { key, held: Held::Reentrant };
        }
        let entry = {
            let mut locks = self.inner.locks.lock();
            locks.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
        };
        let guard = entry.lock_owned().await;
        LockGuard { key, held: Held::Acquired(key, self.inner.clone(), guard) }
    }
}

impl HeldLocks {
    /// Returns a copy of this reentrancy set with `key` added, for passing
    /// down into a recursive call after acquiring the lock for `key`.
    pub fn with(&self, key: LockKey) -> Self {
        let mut next = self.0.clone();
        next.insert(key);
        Self(next)
    }
}

pub fn key_for(container_type: ContainerType, id: Uuid) -> LockKey {
    (container_type, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reentrant_acquire_does_not_deadlock() {
        let registry = LockRegistry::new();
        let key = key_for(ContainerType::Task, Uuid::new_v4());
        let held = HeldLocks::new();

        let _outer = registry.acquire(key, &held).await;
        let held_with_key = held.with(key);
        // A nested call that already holds `key` must not block waiting on
        // itself.
        let _inner = registry.acquire(key, &held_with_key).await;
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let registry = LockRegistry::new();
        let held = HeldLocks::new();
        let a = registry.acquire(key_for(ContainerType::Task, Uuid::new_v4()), &held).await;
        let b = registry.acquire(key_for(ContainerType::Task, Uuid::new_v4()), &held).await;
        drop(a);
        drop(b);
    }

    #[tokio::test]
    async fn lock_is_released_after_guard_drops() {
        let registry = LockRegistry::new();
        let key = key_for(ContainerType::Feature, Uuid::new_v4());
        let held = HeldLocks::new();

        {
            let _guard = registry.acquire(key, &held).await;
        }
        // Since the guard above dropped, a fresh acquire must not block.
        let _guard2 = registry.acquire(key, &held).await;
    }
}
