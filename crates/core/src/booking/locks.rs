//! Per-key serialization of critical sections.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// A family of named mutexes, created on first use.
///
/// Operations on different keys proceed in parallel; operations on the same
/// key run one at a time. Lock entries are kept for the life of the process,
/// which is fine for showing ids and film titles.
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The closure must not block on another keyed lock of the same family,
    /// and async callers must finish every await before entering.
    pub fn with_key_lock<T>(&self, key: &K, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let _guard = lock.lock().unwrap();
        f()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
