//! Cache Store Module
//!
//! Main cache engine: a `HashMap` of entries and the enablement flag behind a
//! single reader/writer lock, with lazy TTL expiration.
//!
//! # Lazy expiration
//! `get` only ever takes the read lock. A stale entry found on read is
//! reported as a miss and left in place; it is physically removed by the next
//! `set`/`delete` on its key, by `clear`, or by a `cleanup` pass (usually run
//! by the reaper, see [`Cache::start_cleanup_scheduler`]). Without a reaper,
//! stale entries accumulate until touched. That is the caller's choice, and
//! `size` reports them.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, StatsSnapshot, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::tasks::{spawn_cleanup_task, CleanupHandle};

// == Guarded State ==
/// Everything protected by the cache's lock.
struct State<V> {
    entries: HashMap<String, CacheEntry<V>>,
    enabled: bool,
}

pub(crate) struct Shared<V, C> {
    state: RwLock<State<V>>,
    clock: C,
    stats: CacheStats,
    /// Id of the running reaper, 0 = none
    reaper_slot: Arc<AtomicU64>,
}

// == Cache ==
/// A thread-safe TTL cache holding values of one type.
///
/// `Cache` is a handle: clones share the same entries, so it can be handed
/// to threads and to the background reaper without extra wrapping.
///
/// `get` returns a clone of the stored value. For large or shared payloads
/// store an `Arc<T>`; callers must not mutate such payloads through interior
/// mutability, since every reader sees the same instance.
pub struct Cache<V, C: Clock = SystemClock> {
    shared: Arc<Shared<V, C>>,
}

impl<V> Cache<V, SystemClock> {
    // == Constructor ==
    /// Creates an empty, enabled cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates an empty cache whose gate follows `config.enabled`.
    ///
    /// The reaper is not started here; see [`Cache::start_configured_reaper`].
    pub fn from_config(config: &Config) -> Self {
        let cache = Self::new();
        if !config.enabled {
            cache.disable();
        }
        cache
    }
}

impl<V> Default for Cache<V, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C: Clock> Clone for Cache<V, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V, C: Clock> fmt::Debug for Cache<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("Cache")
            .field("size", &state.entries.len())
            .field("enabled", &state.enabled)
            .finish()
    }
}

impl<V, C: Clock> Cache<V, C> {
    /// Creates an empty, enabled cache that reads time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(State {
                    entries: HashMap::new(),
                    enabled: true,
                }),
                clock,
                stats: CacheStats::new(),
                reaper_slot: Arc::new(AtomicU64::new(0)),
            }),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, live for `ttl` from now.
    ///
    /// Any previous entry for `key` is replaced outright, live or stale.
    /// A zero `ttl` stores an entry that is already stale. Does nothing while
    /// the cache is disabled.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut state = self.shared.state.write();
        if !state.enabled {
            return;
        }
        let entry = CacheEntry::new(value, self.shared.clock.now(), ttl);
        state.entries.insert(key.into(), entry);
    }

    // == Delete ==
    /// Removes the entry for `key`, if any, regardless of liveness or gate.
    pub fn delete(&self, key: &str) {
        self.shared.state.write().entries.remove(key);
    }

    // == Clear ==
    /// Removes every entry, regardless of the gate.
    pub fn clear(&self) {
        self.shared.state.write().entries = HashMap::new();
    }

    // == Size ==
    /// Returns the physical entry count, stale entries included.
    pub fn size(&self) -> usize {
        self.shared.state.read().entries.len()
    }

    // == Cleanup ==
    /// Removes every stale entry and returns how many were removed.
    ///
    /// Holds the write lock for the whole O(n) scan.
    pub fn cleanup(&self) -> usize {
        let removed = {
            let mut state = self.shared.state.write();
            let now = self.shared.clock.now();
            let before = state.entries.len();
            state.entries.retain(|_, entry| entry.is_live(now));
            before - state.entries.len()
        };
        self.shared.stats.record_cleanup(removed);
        removed
    }

    // == Enablement Gate ==
    /// Makes stored live entries visible again and lets `set` store.
    pub fn enable(&self) {
        self.shared.state.write().enabled = true;
        debug!("cache enabled");
    }

    /// Turns `get` into a constant miss and `set` into a no-op.
    ///
    /// Stored entries are kept; `delete`, `clear`, `size` and `cleanup` still
    /// act on them.
    pub fn disable(&self) {
        self.shared.state.write().enabled = false;
        debug!("cache disabled");
    }

    /// Returns the current state of the gate.
    pub fn enabled(&self) -> bool {
        self.shared.state.read().enabled
    }

    // == Stats ==
    /// Returns current counters together with the physical size and gate.
    pub fn stats(&self) -> StatsSnapshot {
        let (size, enabled) = {
            let state = self.shared.state.read();
            (state.entries.len(), state.enabled)
        };
        self.shared.stats.snapshot(size, enabled)
    }

    // == Time To Live ==
    /// Returns how long the entry for `key` stays live.
    ///
    /// `None` if the key is absent, stale or the cache is disabled; also
    /// `None` for entries whose TTL overflowed and never expire.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let state = self.shared.state.read();
        if !state.enabled {
            return None;
        }
        let now = self.shared.clock.now();
        state
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.ttl_remaining(now))
    }

    // == Reaper ==
    /// Starts a background task that runs [`Cache::cleanup`] every `interval`.
    ///
    /// Must be called from within a tokio runtime. Only one reaper may run
    /// per cache at a time; stop it through the returned handle (or by
    /// dropping the handle) before starting another.
    pub fn start_cleanup_scheduler(&self, interval: Duration) -> Result<CleanupHandle>
    where
        V: Send + Sync + 'static,
    {
        spawn_cleanup_task(self, interval)
    }

    /// Starts the reaper if `config.cleanup_interval` is set.
    pub fn start_configured_reaper(&self, config: &Config) -> Result<Option<CleanupHandle>>
    where
        V: Send + Sync + 'static,
    {
        config
            .cleanup_interval
            .map(|interval| self.start_cleanup_scheduler(interval))
            .transpose()
    }

    pub(crate) fn downgrade(&self) -> Weak<Shared<V, C>> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn from_shared(shared: Arc<Shared<V, C>>) -> Self {
        Self { shared }
    }

    pub(crate) fn reaper_slot(&self) -> &Arc<AtomicU64> {
        &self.shared.reaper_slot
    }
}

impl<V: Clone, C: Clock> Cache<V, C> {
    // == Get ==
    /// Returns the value for `key` if it exists, is live and the cache is
    /// enabled.
    ///
    /// Never-set, stale and disabled all read as `None`. A stale entry is not
    /// removed here, so this never takes the write lock.
    pub fn get(&self, key: &str) -> Option<V> {
        let found = {
            let state = self.shared.state.read();
            if state.enabled {
                let now = self.shared.clock.now();
                state
                    .entries
                    .get(key)
                    .filter(|entry| entry.is_live(now))
                    .map(|entry| entry.value.clone())
            } else {
                None
            }
        };

        match found {
            Some(_) => self.shared.stats.record_hit(),
            None => self.shared.stats.record_miss(),
        }
        found
    }

    // == Get Or Insert ==
    /// Returns the live value for `key`, or computes it with `f`, stores it
    /// for `ttl` and returns it.
    ///
    /// `f` runs without any lock held, so concurrent misses on the same key
    /// may each compute a value; the last `set` wins. While disabled `f`
    /// always runs and nothing is stored.
    pub fn get_or_insert_with<F>(&self, key: &str, ttl: Duration, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = f();
        self.set(key, value.clone(), ttl);
        value
    }
}
