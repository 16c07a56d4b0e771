//! Transient interaction state.
//!
//! Multi-step flows (like the help pages) need to recognise a later event,
//! usually a reaction, as belonging to a message they rendered earlier. An
//! [`InteractionStore`] is a typed key→value map for one such flow, keyed by
//! [`interaction_key`] by convention; [`InteractionStores`] holds the named
//! stores of a router.
//!
//! State is memory-resident and lost on restart. Each store guards its map
//! with its own mutex so workers and the reaction path can share it.
//!
//! # Eviction
//!
//! By default entries live for the whole process. An [`EvictionPolicy`] can
//! bound a store by entry count (least recently touched entries go first)
//! and by idle time.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

/// Builds the conventional `channel:message:user` key.
pub fn interaction_key(channel_id: &str, message_id: &str, user_id: &str) -> String {
    format!("{channel_id}:{message_id}:{user_id}")
}

/// Limits applied to every store of a router.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Maximum number of entries per store.
    pub max_entries: Option<usize>,
    /// Entries untouched for this long are dropped.
    pub ttl: Option<Duration>,
}

impl EvictionPolicy {
    /// No limits.
    pub const UNBOUNDED: Self = Self {
        max_entries: None,
        ttl: None,
    };
}

struct Entry<V> {
    value: V,
    touched: Instant,
}

/// A named, typed key→value map.
pub struct InteractionStore<V> {
    name: String,
    policy: EvictionPolicy,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone + Send + 'static> InteractionStore<V> {
    /// Creates an empty store.
    pub fn new(name: impl Into<String>, policy: EvictionPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The store's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        self.policy
            .ttl
            .is_some_and(|ttl| now.duration_since(entry.touched) >= ttl)
    }

    /// Returns the value under `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if self.expired(entries.get(key)?, now) {
            entries.remove(key);
            return None;
        }
        let entry = entries.get_mut(key)?;
        entry.touched = now;
        Some(entry.value.clone())
    }

    /// Inserts or replaces the value under `key`.
    ///
    /// Writes also sweep expired entries, so a store with a TTL stays bounded
    /// even when old keys are never read again.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        self.purge_locked(&mut entries, now);
        entries.insert(
            key.into(),
            Entry {
                value,
                touched: now,
            },
        );
        self.enforce_capacity(&mut entries);
    }

    /// Applies `f` to the value under `key`, inserting `init()` first when
    /// the key is absent or expired. Runs under one lock, so concurrent
    /// callers never lose an update. Returns the updated value.
    pub fn upsert(&self, key: &str, init: impl FnOnce() -> V, f: impl FnOnce(&mut V)) -> V {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        self.purge_locked(&mut entries, now);

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: init(),
            touched: now,
        });
        f(&mut entry.value);
        entry.touched = now;
        let value = entry.value.clone();

        self.enforce_capacity(&mut entries);
        value
    }

    fn purge_locked(&self, entries: &mut HashMap<String, Entry<V>>, now: Instant) -> usize {
        if self.policy.ttl.is_none() {
            return 0;
        }
        let before = entries.len();
        entries.retain(|_, e| !self.expired(e, now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(store = %self.name, purged, "Dropped expired interaction entries");
        }
        purged
    }

    fn enforce_capacity(&self, entries: &mut HashMap<String, Entry<V>>) {
        let Some(max) = self.policy.max_entries else {
            return;
        };
        while entries.len() > max {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.touched)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            debug!(store = %self.name, key = %oldest, "Evicting interaction entry");
            entries.remove(&oldest);
        }
    }

    /// Applies `f` to the value under `key` while holding the lock and
    /// returns the updated value.
    pub fn update(&self, key: &str, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        if self.expired(entries.get(key)?, now) {
            entries.remove(key);
            return None;
        }
        let entry = entries.get_mut(key)?;
        f(&mut entry.value);
        entry.touched = now;
        Some(entry.value.clone())
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().remove(key).map(|e| e.value)
    }

    /// Drops every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        self.purge_locked(&mut entries, Instant::now())
    }

    /// Number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V> std::fmt::Debug for InteractionStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionStore")
            .field("name", &self.name)
            .field("entries", &self.entries.lock().len())
            .field("policy", &self.policy)
            .finish()
    }
}

type ErasedStore = Arc<dyn Any + Send + Sync>;

/// The named interaction stores of one router.
#[derive(Default)]
pub struct InteractionStores {
    policy: EvictionPolicy,
    stores: RwLock<HashMap<String, ErasedStore>>,
}

impl InteractionStores {
    /// Creates an empty registry whose stores use `policy`.
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Creates (or re-creates) the store `name` holding `V` values.
    ///
    /// Re-initializing a live store wipes its state; handlers still holding
    /// the old `Arc` keep writing to the detached map.
    pub fn init<V>(&self, name: &str) -> Arc<InteractionStore<V>>
    where
        V: Clone + Send + Sync + 'static,
    {
        let store = Arc::new(InteractionStore::<V>::new(name, self.policy));
        let previous = self
            .stores
            .write()
            .insert(name.to_string(), Arc::clone(&store) as ErasedStore);
        if previous.is_some() {
            warn!(store = %name, "Interaction store re-initialized, previous state dropped");
        }
        store
    }

    /// Returns the store `name` if it exists and holds `V` values.
    pub fn get<V>(&self, name: &str) -> Option<Arc<InteractionStore<V>>>
    where
        V: Clone + Send + Sync + 'static,
    {
        let erased = self.stores.read().get(name).cloned()?;
        erased.downcast::<InteractionStore<V>>().ok()
    }

    /// Whether a store called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.stores.read().contains_key(name)
    }

    /// Names of all stores.
    pub fn names(&self) -> Vec<String> {
        self.stores.read().keys().cloned().collect()
    }

    /// The policy new stores are created with.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }
}

impl std::fmt::Debug for InteractionStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionStores")
            .field("stores", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}
