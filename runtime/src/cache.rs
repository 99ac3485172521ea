//! Compilation cache.
//!
//! Maps exact-equality keys to built values for the lifetime of the cache;
//! there is no eviction. Each key is built at most once:
//!
//! - Built entries live in papaya's lock-free map, so hits never block.
//! - First use of a key takes a per-key gate. Concurrent callers for the same
//!   key wait on the gate and then find the entry; different keys build in
//!   parallel.
//! - A key requested again by the thread that is currently building it fails
//!   with [`Error::ReentrantBuild`](crate::Error::ReentrantBuild) rather than
//!   deadlocking on its own gate.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::error::{ReentrantBuildSnafu, Result};

pub struct KernelCache<K, V> {
    name: &'static str,
    entries: papaya::HashMap<K, Arc<V>>,
    gates: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    in_progress: Mutex<HashMap<K, ThreadId>>,
    hits: AtomicUsize,
    builds: AtomicUsize,
}

impl<K, V> std::fmt::Debug for KernelCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelCache")
            .field("name", &self.name)
            .field("len", &self.entries.pin().len())
            .field("hits", &self.hits())
            .field("builds", &self.builds())
            .field("pending", &self.pending())
            .finish()
    }
}

impl<K, V> KernelCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty cache; `name` appears in logs and errors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: papaya::HashMap::new(),
            gates: Mutex::new(HashMap::new()),
            in_progress: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.pin().get(key).cloned()
    }

    /// Return the entry for `key`, building it with `build` on first use.
    ///
    /// A failed build leaves no entry behind; the next request builds again.
    pub fn get_or_try_build<F>(&self, key: &K, build: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        let me = std::thread::current().id();
        if self.in_progress.lock().get(key) == Some(&me) {
            return ReentrantBuildSnafu { cache: self.name }.fail();
        }

        let gate = Arc::clone(self.gates.lock().entry(key.clone()).or_default());
        let _guard = gate.lock();

        // Another thread may have finished while we waited.
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        tracing::debug!(cache = self.name, "cache miss, building");
        self.in_progress.lock().insert(key.clone(), me);
        let built = build();
        self.in_progress.lock().remove(key);

        let value = match built {
            Ok(value) => Arc::new(value),
            Err(error) => {
                // Waiters still hold the gate and retry the build; the last one out removes it.
                let mut gates = self.gates.lock();
                if gates.get(key).is_some_and(|g| Arc::strong_count(g) <= 2) {
                    gates.remove(key);
                }
                return Err(error);
            }
        };
        self.entries.pin().insert(key.clone(), Arc::clone(&value));
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.gates.lock().remove(key);

        Ok(value)
    }

    fn lookup(&self, key: &K) -> Option<Arc<V>> {
        let value = self.get(key)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(cache = self.name, "cache hit");
        Some(value)
    }
}

impl<K, V> KernelCache<K, V>
where
    K: Hash + Eq,
{
    /// Number of requests served from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of successful builds.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a build gate outstanding.
    pub fn pending(&self) -> usize {
        self.gates.lock().len()
    }
}
