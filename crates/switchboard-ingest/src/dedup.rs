//! At-least-once delivery guard.
//!
//! The platform redelivers an event (same `event_id`) when it does not see an
//! ack in time, and the retries can overlap the original request. The store
//! answers "seen before?" and records the key in one atomic step so two
//! concurrent deliveries can never both be treated as new.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Identity of one delivered event: `team_id:event_id`, or a body digest when
/// the envelope carries no event id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(team_id: Option<&str>, event_id: Option<&str>, body: &[u8]) -> Self {
        match event_id.filter(|id| !id.is_empty()) {
            Some(event_id) => Self(format!("{}:{}", team_id.unwrap_or_default(), event_id)),
            None => Self(format!("sha256:{}", hex::encode(Sha256::digest(body)))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend for the dedup cache.
pub trait DedupStore: Send + Sync {
    /// Return `true` if `key` is already live; otherwise record it and return
    /// `false`. Must be atomic per key.
    fn check_and_insert(&self, key: &DedupKey, now: Instant) -> Result<bool>;

    /// Forget `key` so its next sighting counts as new.
    fn remove(&self, key: &DedupKey) -> Result<()>;

    /// Drop expired keys, returning how many were removed.
    fn prune_expired(&self, now: Instant) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store on a sharded concurrent map.
pub struct InMemoryStore {
    /// key → expiry instant
    entries: DashMap<String, Instant>,
    ttl: Duration,
    capacity: usize,
    /// Size an over-capacity map is trimmed down to.
    low_water: usize,
}

impl InMemoryStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
            low_water: capacity - (capacity / 10).max(1),
        }
    }

    /// Purge expired keys, then evict the soonest-expiring ones down to the
    /// low-water mark. All keys share one TTL, so soonest-expiring is oldest.
    /// Trimming below capacity means the full scan runs once per
    /// `capacity / 10` inserts rather than on every insert.
    fn enforce_capacity(&self, now: Instant) {
        self.prune_expired(now);
        let len = self.entries.len();
        if len <= self.capacity {
            return;
        }

        let mut by_expiry: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        by_expiry.sort_by_key(|(_, expires)| *expires);

        let excess = len - self.low_water;
        for (key, _) in by_expiry.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!(evicted = excess, capacity = self.capacity, "dedup cache at capacity");
    }
}

impl DedupStore for InMemoryStore {
    fn check_and_insert(&self, key: &DedupKey, now: Instant) -> Result<bool> {
        let expires = now + self.ttl;
        // The entry guard holds the shard lock; it is released at the end of
        // the match, before any whole-map operation.
        let duplicate = match self.entries.entry(key.0.clone()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    true
                } else {
                    entry.insert(expires);
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(expires);
                false
            }
        };

        if !duplicate && self.entries.len() > self.capacity {
            self.enforce_capacity(now);
        }
        Ok(duplicate)
    }

    fn remove(&self, key: &DedupKey) -> Result<()> {
        self.entries.remove(key.as_str());
        Ok(())
    }

    fn prune_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires| *expires > now);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Front door to the dedup store. Cheap to clone.
#[derive(Clone)]
pub struct Deduplicator {
    store: Arc<dyn DedupStore>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn DedupStore>) -> Self {
        Self { store }
    }

    pub fn in_memory(ttl: Duration, capacity: usize) -> Self {
        Self::new(Arc::new(InMemoryStore::new(ttl, capacity)))
    }

    /// `false` exactly once per key within the TTL window.
    ///
    /// A store failure fails open: the event is processed rather than lost.
    pub fn is_duplicate(&self, key: &DedupKey) -> bool {
        match self.store.check_and_insert(key, Instant::now()) {
            Ok(duplicate) => duplicate,
            Err(e) => {
                warn!(key = %key, error = %e, "dedup check failed, treating event as new");
                false
            }
        }
    }

    /// Release a key recorded by [`is_duplicate`](Self::is_duplicate) whose
    /// event could not be handed on, so a redelivery is processed.
    pub fn forget(&self, key: &DedupKey) {
        if let Err(e) = self.store.remove(key) {
            warn!(key = %key, error = %e, "could not release dedup key");
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Sweep expired keys every `interval` until `cancel` fires.
    pub fn spawn_pruner(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let removed = store.prune_expired(Instant::now());
                        if removed > 0 {
                            debug!(removed, remaining = store.len(), "dedup cache pruned");
                        }
                    }
                    _ = cancel.cancelled() => {
                        info!("dedup pruner stopped");
                        break;
                    }
                }
            }
        })
    }
}
