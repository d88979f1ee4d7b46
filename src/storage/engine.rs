//! TTL Key-Value Store
//!
//! This module implements the store itself: a value table, an expiration
//! index, and an expiration heap, all kept behind one mutex.
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: Every operation that touches the three structures holds the
//!    same `Mutex` for its whole duration. Nothing inside a critical section
//!    blocks or awaits.
//! 2. **Lazy + Active Expiry**: `get` evicts an expired key it runs into; the
//!    background sweeper drains the heap once per interval.
//! 3. **One Heap Record Per Key**: Overwriting a key moves its existing heap
//!    record, and deleting a key removes it, so the heap never collects stale
//!    records.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────── TtlStore ─────────────────────────────┐
//! │                                                                   │
//! │   Mutex<StoreState>                                               │
//! │   ┌───────────────┐  ┌────────────────────┐  ┌────────────────┐   │
//! │   │ values        │  │ expirations        │  │ heap           │   │
//! │   │ key → V       │  │ key → Instant      │  │ min by Instant │   │
//! │   └───────────────┘  └────────────────────┘  └────────────────┘   │
//! │                                ▲                                  │
//! │                                │ sweep_expired() every interval   │
//! │                       ┌────────┴────────┐                         │
//! │                       │  ExpirySweeper  │                         │
//! │                       └─────────────────┘                         │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invariants, checked by the tests after every scenario:
//! - a key is in `values` iff it is in `expirations`
//! - every key in `expirations` has exactly one heap record with the same
//!   deadline, and the heap holds nothing else

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::expiry::{ExpiryConfig, ExpirySweeper};
use crate::storage::heap::ExpiryHeap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

/// TTL applied when `set` is called with a zero duration (10 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60 * 60);

/// Longest TTL the store will schedule. Larger values are clamped so that
/// `Instant` arithmetic cannot overflow.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Configuration for a [`TtlStore`].
///
/// # Example
///
/// ```
/// use ttlkv::storage::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_default_ttl(Duration::from_secs(60))
///     .with_sweep_interval(Duration::from_millis(250));
///
/// assert_eq!(config.default_ttl, Duration::from_secs(60));
/// assert_eq!(config.expiry.interval, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// TTL used when `set` receives a zero duration (default: 10 hours)
    pub default_ttl: Duration,

    /// Background sweeper settings
    pub expiry: ExpiryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            expiry: ExpiryConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL substituted for a zero `ttl` argument.
    ///
    /// A zero value here falls back to [`DEFAULT_TTL`].
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets how often the background sweeper runs.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.expiry = self.expiry.with_interval(interval);
        self
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of entries in the value table (expired-but-unswept included)
    pub keys: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total DELETE operations
    pub del_ops: u64,
    /// Keys evicted by `get` after their deadline passed
    pub expired_on_access: u64,
    /// Keys evicted by sweep passes
    pub expired_by_sweep: u64,
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of keys evicted during the pass
    pub evicted: u64,
    /// Number of keys left in the store when the pass finished
    pub keys_remaining: usize,
}

/// The three structures guarded by the store lock.
#[derive(Debug)]
struct StoreState<V> {
    values: HashMap<String, V>,
    expirations: HashMap<String, Instant>,
    heap: ExpiryHeap,
}

impl<V> StoreState<V> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            expirations: HashMap::new(),
            heap: ExpiryHeap::new(),
        }
    }

    /// Removes `key` from all three structures.
    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.expirations.remove(key);
        self.heap.remove(key);
    }

    fn clear(&mut self) {
        self.values.clear();
        self.expirations.clear();
        self.heap.clear();
    }
}

/// Shared core of the store, referenced by both the public handle and the
/// sweeper task.
pub(crate) struct StoreCore<V> {
    state: Mutex<StoreState<V>>,
    default_ttl: Duration,

    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
    expired_on_access: AtomicU64,
    expired_by_sweep: AtomicU64,
}

impl<V> StoreCore<V> {
    pub(crate) fn new(default_ttl: Duration) -> Self {
        let default_ttl = if default_ttl.is_zero() {
            DEFAULT_TTL
        } else {
            default_ttl
        };

        Self {
            state: Mutex::new(StoreState::new()),
            default_ttl,
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_on_access: AtomicU64::new(0),
            expired_by_sweep: AtomicU64::new(0),
        }
    }

    /// Acquires the store lock.
    ///
    /// No critical section can panic halfway through an update, so a
    /// poisoned lock still guards consistent state and is taken over.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, StoreState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// Evicts every key whose deadline is at or before now.
    ///
    /// Holds the lock for the whole pass, so its length is proportional to
    /// the number of overdue keys.
    pub(crate) fn sweep_expired(&self) -> SweepReport {
        let now = Instant::now();
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut evicted = 0u64;

        while state.heap.peek().is_some_and(|record| record.expires_at <= now) {
            let Some(record) = state.heap.pop() else {
                break;
            };

            // Only evict if the index still carries this deadline
            if state.expirations.get(&record.key) == Some(&record.expires_at) {
                state.values.remove(&record.key);
                state.expirations.remove(&record.key);
                evicted += 1;
            }
        }

        let keys_remaining = state.values.len();
        drop(guard);

        if evicted > 0 {
            self.expired_by_sweep.fetch_add(evicted, Ordering::Relaxed);
        }

        SweepReport {
            evicted,
            keys_remaining,
        }
    }

    /// Panics if the three structures disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let state = self.lock();

        assert_eq!(state.values.len(), state.expirations.len());
        assert_eq!(state.heap.len(), state.expirations.len());
        assert!(state.heap.is_consistent());

        for (key, expires_at) in &state.expirations {
            assert!(state.values.contains_key(key), "{} missing from values", key);
            let record = state.heap.get(key);
            assert_eq!(record.map(|r| r.expires_at), Some(*expires_at));
        }
    }
}

/// An in-process key-value store whose entries expire after a TTL.
///
/// Creating a store spawns its background sweeper on the current Tokio
/// runtime. `get`, `set`, and `delete` are synchronous and may be called from
/// any thread; wrap the store in an `Arc` to share it.
///
/// # Example
///
/// ```
/// use ttlkv::storage::{StoreError, TtlStore};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = TtlStore::new();
///
/// store.set("session", "token123", Duration::from_secs(60));
/// assert_eq!(store.get("session"), Ok("token123"));
///
/// store.delete("session");
/// assert!(matches!(store.get("session"), Err(StoreError::NotFound { .. })));
///
/// store.shutdown().await;
/// # }
/// ```
pub struct TtlStore<V> {
    core: Arc<StoreCore<V>>,
    sweeper: ExpirySweeper,
}

impl<V> std::fmt::Debug for TtlStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlStore")
            .field("keys", &self.core.len())
            .field("default_ttl", &self.core.default_ttl)
            .field("sweeper_running", &self.sweeper.is_running())
            .finish()
    }
}

impl<V: Send + 'static> Default for TtlStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + 'static> TtlStore<V> {
    /// Creates a store with default settings and starts its sweeper.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a store with the given settings and starts its sweeper.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config(config: StoreConfig) -> Self {
        let core = Arc::new(StoreCore::new(config.default_ttl));
        let sweeper = ExpirySweeper::start(Arc::clone(&core), config.expiry);

        Self { core, sweeper }
    }
}

impl<V> TtlStore<V> {
    /// Looks up `key`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the key is not in the store.
    /// - [`StoreError::Expired`] if the key's deadline has passed. The entry
    ///   is evicted by this call, so the next lookup reports `NotFound`.
    pub fn get(&self, key: &str) -> StoreResult<V>
    where
        V: Clone,
    {
        self.core.get_count.fetch_add(1, Ordering::Relaxed);

        let now = Instant::now();
        let mut state = self.core.lock();

        let Some(&expires_at) = state.expirations.get(key) else {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        };

        if expires_at < now {
            state.remove(key);
            drop(state);

            self.core.expired_on_access.fetch_add(1, Ordering::Relaxed);
            trace!(key, "Evicted expired key on access");

            return Err(StoreError::Expired {
                key: key.to_string(),
            });
        }

        state
            .values
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// A zero `ttl` means the configured default TTL. Any previous value and
    /// deadline for the key are replaced.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.core.set_count.fetch_add(1, Ordering::Relaxed);

        let key = key.into();
        let ttl = if ttl.is_zero() {
            self.core.default_ttl
        } else {
            ttl
        };

        let mut guard = self.core.lock();
        let state = &mut *guard;
        let expires_at = Instant::now() + ttl.min(MAX_TTL);

        state.values.insert(key.clone(), value);
        state.expirations.insert(key.clone(), expires_at);
        state.heap.push(key, expires_at);
    }

    /// Stores `value` under `key` with the default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, Duration::ZERO);
    }

    /// Removes `key`. Does nothing if the key is absent.
    pub fn delete(&self, key: &str) {
        self.core.del_count.fetch_add(1, Ordering::Relaxed);
        self.core.lock().remove(key);
    }

    /// Checks whether `key` is present and not yet expired.
    ///
    /// Unlike `get`, this never evicts.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.core
            .lock()
            .expirations
            .get(key)
            .is_some_and(|&expires_at| expires_at >= now)
    }

    /// Returns the time left before `key` expires, or `None` if the key is
    /// absent or already expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.core
            .lock()
            .expirations
            .get(key)
            .and_then(|&expires_at| expires_at.checked_duration_since(now))
    }

    /// Number of entries in the value table.
    ///
    /// Expired entries that neither `get` nor the sweeper has reached yet
    /// are still counted.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records in the expiration heap.
    pub fn tracked_expirations(&self) -> usize {
        self.core.lock().heap.len()
    }

    /// Runs one sweep pass now, on the calling thread.
    pub fn sweep_expired(&self) -> SweepReport {
        self.core.sweep_expired()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.core.lock().clear();
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len() as u64,
            get_ops: self.core.get_count.load(Ordering::Relaxed),
            set_ops: self.core.set_count.load(Ordering::Relaxed),
            del_ops: self.core.del_count.load(Ordering::Relaxed),
            expired_on_access: self.core.expired_on_access.load(Ordering::Relaxed),
            expired_by_sweep: self.core.expired_by_sweep.load(Ordering::Relaxed),
        }
    }

    /// Returns true while the background sweeper task is alive.
    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Stops the background sweeper and waits for it to exit.
    ///
    /// The store stays usable afterwards; expired keys are then only removed
    /// by `get` or by calling [`sweep_expired`](Self::sweep_expired).
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self) {
        self.sweeper.shutdown().await;
    }
}
