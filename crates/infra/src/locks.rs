//! Keyed lock registry with bounded waits.
//!
//! Every entry lives behind its own `parking_lot::Mutex`, so operations on
//! different keys never contend. The registry map itself is only held long
//! enough to clone an entry handle; entry locks are never taken while the map
//! lock is held.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};

use stockyard_core::{DomainError, DomainResult};

/// Default bound on how long an operation waits for a contended key.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);

pub type Handle<V> = Arc<Mutex<V>>;

#[derive(Debug)]
pub struct LockRegistry<K, V> {
    entries: RwLock<HashMap<K, Handle<V>>>,
    timeout: Duration,
}

impl<K, V> LockRegistry<K, V>
where
    K: Clone + Eq + Hash + Display,
{
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    pub fn get(&self, key: &K) -> Option<Handle<V>> {
        self.entries.read().get(key).cloned()
    }

    pub fn get_or_insert_with(&self, key: &K, init: impl FnOnce() -> V) -> Handle<V> {
        if let Some(h) = self.get(key) {
            return h;
        }
        self.entries
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(init())))
            .clone()
    }

    /// Insert a new entry. An existing key is a `Conflict`.
    pub fn insert_new(&self, key: K, value: V) -> DomainResult<Handle<V>> {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(DomainError::conflict(format!("{key} already exists")));
        }
        let handle = Arc::new(Mutex::new(value));
        entries.insert(key, handle.clone());
        Ok(handle)
    }

    pub fn remove(&self, key: &K) -> Option<Handle<V>> {
        self.entries.write().remove(key)
    }

    /// All entry handles, unordered.
    pub fn handles(&self) -> Vec<(K, Handle<V>)> {
        self.entries
            .read()
            .iter()
            .map(|(k, h)| (k.clone(), h.clone()))
            .collect()
    }

    /// Lock one entry, waiting at most the configured timeout.
    pub fn lock<'a>(&self, key: &K, handle: &'a Mutex<V>) -> DomainResult<MutexGuard<'a, V>> {
        handle.try_lock_for(self.timeout).ok_or_else(|| {
            tracing::warn!(key = %key, timeout_ms = self.timeout.as_millis() as u64, "lock wait timed out");
            DomainError::busy(format!("{key} is locked by another operation, retry later"))
        })
    }

    /// Consistent copy of every entry.
    pub fn snapshot(&self) -> DomainResult<Vec<V>>
    where
        V: Clone,
    {
        let handles = self.handles();
        let mut out = Vec::with_capacity(handles.len());
        for (key, handle) in &handles {
            out.push(self.lock(key, handle)?.clone());
        }
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn insert_new_rejects_duplicates() {
        let reg: LockRegistry<u32, &str> = LockRegistry::new(DEFAULT_LOCK_TIMEOUT);
        reg.insert_new(1, "a").unwrap();
        let err = reg.insert_new(1, "b").unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn get_or_insert_initializes_once() {
        let reg: LockRegistry<u32, u32> = LockRegistry::new(DEFAULT_LOCK_TIMEOUT);
        let a = reg.get_or_insert_with(&7, || 1);
        let b = reg.get_or_insert_with(&7, || 99);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b.lock(), 1);
    }

    #[test]
    fn contended_lock_times_out_as_busy() {
        let reg = Arc::new(LockRegistry::<u32, u32>::new(Duration::from_millis(50)));
        let handle = reg.get_or_insert_with(&1, || 0);
        let holding = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let holder = {
            let (handle, holding, release) = (handle.clone(), holding.clone(), release.clone());
            thread::spawn(move || {
                let _guard = handle.lock();
                holding.wait();
                release.wait();
            })
        };

        holding.wait();
        let err = reg.lock(&1, &handle).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.code(), "BUSY");
        release.wait();
        holder.join().unwrap();

        assert!(reg.lock(&1, &handle).is_ok());
    }
}
