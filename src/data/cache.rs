//! Read-through memoization cache.
//!
//! Each entry is computed at most once and then shared as an `Rc`. Entries
//! are never replaced or evicted; the cache lives as long as its owner.
//!
//! Loaders may themselves consult caches (including this one, e.g. a county
//! name resolving its state's name), so no borrow is held while a value is
//! being computed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::rc::Rc;

pub struct MemoCache<K, V> {
    name: &'static str,
    entries: RefCell<HashMap<K, Rc<V>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Returns the cached value for `key`, or computes and stores it.
    ///
    /// A failed computation stores nothing, so the next call retries it.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, load: F) -> Result<Rc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            self.hits.set(self.hits.get() + 1);
            log::debug!("{} cache hit: {}", self.name, key);
            return Ok(value);
        }

        self.misses.set(self.misses.get() + 1);
        let value = Rc::new(load()?);
        Ok(self.insert(key.clone(), value))
    }

    /// Like `get_or_try_insert_with` for computations that cannot fail.
    pub fn get_or_insert_with<F>(&self, key: &K, load: F) -> Rc<V>
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with(key, || Ok::<V, std::convert::Infallible>(load())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Stores an already shared value under `key`.
    ///
    /// If the key is present the existing value is kept and returned.
    pub fn insert(&self, key: K, value: Rc<V>) -> Rc<V> {
        self.entries
            .borrow_mut()
            .entry(key)
            .or_insert(value)
            .clone()
    }

    pub fn get(&self, key: &K) -> Option<Rc<V>> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.get(), self.misses.get())
    }
}
