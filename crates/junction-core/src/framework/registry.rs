//! Listener registry with copy-on-write snapshots.
//!
//! The registry is the one structure shared by every push and every
//! registration call, so its read path must never block on its write
//! path. Listeners are stored as an immutable, priority-sorted
//! `Arc<Vec<_>>`; readers clone the `Arc` (one brief read-lock) and
//! iterate their private snapshot, while writers rebuild a fresh vector
//! and swap it in. A push can therefore never observe a half-registered
//! listener or a torn ordering.
//!
//! Each entry also owns the listener's target-match memo: the sets of key
//! ids already resolved as hits or misses against the listener's static
//! `targets`. The memo is behind a per-entry lock — matching one listener
//! never contends with matching another.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::foundation::key::EventKey;
use crate::framework::listener::EventListener;

/// A listener plus its registration bookkeeping.
pub struct RegisteredListener {
    listener: Arc<dyn EventListener>,
    seq: u64,
    cache: RwLock<TargetCache>,
}

#[derive(Default)]
struct TargetCache {
    hits: HashSet<String>,
    misses: HashSet<String>,
}

impl RegisteredListener {
    fn new(listener: Arc<dyn EventListener>, seq: u64) -> Self {
        Self {
            listener,
            seq,
            cache: RwLock::new(TargetCache::default()),
        }
    }

    /// The wrapped listener.
    pub fn listener(&self) -> &Arc<dyn EventListener> {
        &self.listener
    }

    /// The listener's id.
    pub fn id(&self) -> &str {
        self.listener.id()
    }

    /// The listener's priority.
    pub fn priority(&self) -> i32 {
        self.listener.priority()
    }

    /// Resolves whether an event keyed `key` falls within this listener's
    /// targets.
    ///
    /// Empty `targets` matches everything. Otherwise the answer is
    /// memoized per key id: the memo is append-only and derived solely
    /// from the static targets and the key parent graph, so a warmed
    /// entry always agrees with the cold traversal.
    pub fn is_target(&self, key: &EventKey) -> bool {
        let targets = self.listener.targets();
        if targets.is_empty() {
            return true;
        }

        {
            let cache = self.cache.read();
            if cache.hits.contains(key.id()) {
                return true;
            }
            if cache.misses.contains(key.id()) {
                return false;
            }
        }

        let hit = targets.iter().any(|target| key.is_sub_of(target));

        let mut cache = self.cache.write();
        if hit {
            cache.hits.insert(key.id().to_owned());
        } else {
            cache.misses.insert(key.id().to_owned());
        }
        hit
    }
}

impl std::fmt::Debug for RegisteredListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredListener")
            .field("id", &self.id())
            .field("priority", &self.priority())
            .field("seq", &self.seq)
            .finish()
    }
}

/// An ordered snapshot of registered listeners.
pub type ListenerSnapshot = Arc<Vec<Arc<RegisteredListener>>>;

/// Registry of listeners, ordered by (priority, registration order).
///
/// Safe to mutate from any thread while dispatches iterate concurrently.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: RwLock<ListenerSnapshot>,
    seq: AtomicU64,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn register(&self, listener: impl EventListener + 'static) {
        self.register_arc(Arc::new(listener));
    }

    /// Registers an already-shared listener.
    pub fn register_arc(&self, listener: Arc<dyn EventListener>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(RegisteredListener::new(listener, seq));
        debug!(listener = entry.id(), priority = entry.priority(), "Registered listener");

        let mut guard = self.inner.write();
        let mut next: Vec<Arc<RegisteredListener>> = guard.iter().cloned().collect();
        next.push(entry);
        // Stable total order: priority ascending, registration order for ties.
        next.sort_by_key(|e| (e.priority(), e.seq));
        *guard = Arc::new(next);
    }

    /// Removes the listener with the given id.
    ///
    /// Returns whether a listener was removed; unregistering an unknown
    /// id is a no-op, not an error.
    pub fn unregister(&self, id: &str) -> bool {
        let mut guard = self.inner.write();
        let before = guard.len();
        let next: Vec<Arc<RegisteredListener>> =
            guard.iter().filter(|e| e.id() != id).cloned().collect();
        let removed = next.len() != before;
        if removed {
            debug!(listener = id, "Unregistered listener");
            *guard = Arc::new(next);
        }
        removed
    }

    /// Returns the current ordered snapshot.
    ///
    /// The snapshot is immutable; registrations after this call do not
    /// affect it.
    pub fn snapshot(&self) -> ListenerSnapshot {
        Arc::clone(&self.inner.read())
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}
