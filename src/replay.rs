//! Anti-replay store.
//!
//! Tracks replay keys (typically `issuer:assertion-id`) until their recorded
//! expiration so one-time-use assertions cannot be presented twice. Shared
//! across all validations for the process lifetime; the handle is cheap to
//! clone and safe for concurrent use.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::error::ReplayError;

/// Entries examined between opportunistic sweeps of expired keys.
const SWEEP_INTERVAL: u64 = 64;

/// Concurrency-safe replay cache.
///
/// The check-then-insert in [`check_and_record`](Self::check_and_record) is
/// atomic per key: two concurrent calls with the same unexpired key admit
/// exactly one of them.
#[derive(Clone)]
pub struct ReplayCache {
    inner: Arc<Inner>,
}

struct Inner {
    entries: DashMap<String, DateTime<Utc>>,
    default_expiration: Duration,
    clock: Arc<dyn Clock>,
    inserts: AtomicU64,
}

impl ReplayCache {
    /// Creates a cache with the given process-wide default expiration.
    #[must_use]
    pub fn new(default_expiration: Duration) -> Self {
        Self::with_clock(default_expiration, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from the supplied clock.
    #[must_use]
    pub fn with_clock(default_expiration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                default_expiration,
                clock,
                inserts: AtomicU64::new(0),
            }),
        }
    }

    /// The process-wide default expiration for new entries.
    #[must_use]
    pub fn default_expiration(&self) -> Duration {
        self.inner.default_expiration
    }

    /// Atomically checks a key and records it until `expires_at`.
    ///
    /// Returns [`ReplayError`] when the key is already present and its
    /// stored expiration has not elapsed. An expired entry is replaced in
    /// place; it is never extended by reinsertion while still live.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is a replay.
    pub fn check_and_record(
        &self,
        key: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ReplayError> {
        let key = key.into();
        let now = self.inner.clock.now();

        match self.inner.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    tracing::warn!(key = %occupied.key(), "replay detected");
                    return Err(ReplayError {
                        key: occupied.key().clone(),
                    });
                }
                occupied.insert(expires_at);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(expires_at);
            }
        }

        if self.inner.inserts.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL
            == SWEEP_INTERVAL - 1
        {
            self.sweep();
        }
        Ok(())
    }

    /// Records a key using the default expiration.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is a replay.
    pub fn check_and_record_default(&self, key: impl Into<String>) -> Result<(), ReplayError> {
        let expires_at = self
            .inner
            .clock
            .now()
            .checked_add_signed(self.inner.default_expiration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.check_and_record(key, expires_at)
    }

    /// Removes entries whose expiration has passed.
    ///
    /// Only expired entries are removed, so a sweep can never turn a live
    /// replay key into a false negative.
    pub fn sweep(&self) {
        let now = self.inner.clock.now();
        self.inner.entries.retain(|_, expires_at| *expires_at > now);
    }

    /// Number of entries currently held (including not-yet-swept expired ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl std::fmt::Debug for ReplayCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayCache")
            .field("entries", &self.inner.entries.len())
            .field("default_expiration", &self.inner.default_expiration)
            .finish()
    }
}
