//! In-memory key/value cache with per-entry expiry.

use std::{fmt, hash::Hash, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Number of entries above which `set` sweeps expired entries first.
const PURGE_THRESHOLD: usize = 1024;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Timestamp,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }
}

/// Cache whose entries become unreadable once their TTL has elapsed.
///
/// Expired entries are evicted lazily when they are next touched, and in bulk
/// once the map grows past an internal threshold.
pub struct TtlCache<K, V> {
    ttl: SignedDuration,
    clock: Arc<dyn Clock>,
    entries: Mutex<FxHashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
{
    /// Create a cache backed by the system clock.
    #[must_use]
    pub fn new(ttl: SignedDuration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(ttl: SignedDuration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> SignedDuration {
        self.ttl
    }

    /// Store `value` under `key`, replacing any existing entry and resetting
    /// its expiry.
    pub fn set(&self, key: K, value: V) {
        let now = self.clock.now();
        let expires_at = now.saturating_add(self.ttl).unwrap_or(Timestamp::MAX);

        let mut entries = self.entries.lock();

        if entries.len() >= PURGE_THRESHOLD {
            entries.retain(|_, entry| entry.is_live(now));
        }

        entries.insert(key, Entry { value, expires_at });
    }

    /// Return a clone of the live value under `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.update(key, |value| value.clone())
    }

    /// Run `f` against the live value under `key` while holding the lock.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => Some(f(&mut entry.value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Remove and return the live value under `key` if `predicate` accepts it.
    ///
    /// The check and the removal happen under one lock acquisition, so at most
    /// one caller can take a given entry.
    pub fn take_if(&self, key: &K, predicate: impl FnOnce(&V) -> bool) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let entry = entries.get(key)?;

        if !entry.is_live(now) {
            entries.remove(key);
            return None;
        }

        if !predicate(&entry.value) {
            return None;
        }

        entries.remove(key).map(|entry| entry.value)
    }

    /// Remove the entry under `key`, live or not.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key).map(|entry| entry.value)
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();

        entries.retain(|_, entry| entry.is_live(now));

        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<Timestamp>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(start: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    pub(crate) fn advance(&self, by: SignedDuration) {
        let mut now = self.now.lock();

        *now = now.saturating_add(by).unwrap_or(Timestamp::MAX);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
