//! Per-push processing context.
//!
//! [`EventProcessingContext`] is the scratch state for one push: the
//! triggering event, the append-only list of results collected so far,
//! and an [`AttributeMap`] for cross-listener communication. The
//! dispatcher creates one at the start of `push` and drops it at the end;
//! a context is never shared across pushes, which is what isolates
//! concurrent pushes from each other without any dispatcher-level locks.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::event::BoxedEvent;
use super::result::{EventProcessingResult, EventResult};

/// Scratch state for a single push.
///
/// Shared as `Arc` between the dispatcher, interceptors, preparers, and
/// listeners of that push (and any detached listener tasks it spawns).
/// Interior mutability is lock-per-field; no guard is ever held across an
/// await.
pub struct EventProcessingContext {
    event: BoxedEvent,
    results: Mutex<Vec<EventResult>>,
    attributes: AttributeMap,
}

impl EventProcessingContext {
    /// Creates a fresh context for `event`.
    pub fn new(event: BoxedEvent) -> Self {
        Self {
            event,
            results: Mutex::new(Vec::new()),
            attributes: AttributeMap::default(),
        }
    }

    /// The event being processed.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// A read-only snapshot of the results collected so far, in listener
    /// execution order.
    pub fn results(&self) -> Vec<EventResult> {
        self.results.lock().clone()
    }

    /// Appends a result. Append-only: recorded results are never removed
    /// or reordered.
    pub(crate) fn push_result(&self, result: EventResult) {
        self.results.lock().push(result);
    }

    /// The cross-listener attribute map for this push.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Freezes the collected results into the final processing result.
    pub(crate) fn finish(&self) -> EventProcessingResult {
        EventProcessingResult::new(self.results.lock().clone())
    }
}

impl std::fmt::Debug for EventProcessingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProcessingContext")
            .field("event", &self.event)
            .field("results", &self.results.lock().len())
            .finish()
    }
}

/// String-keyed, type-erased attribute store.
///
/// Listeners and preparers within one push use this to pass derived state
/// downstream (a trimmed text field, a parsed command, a permission
/// decision). Values are `Arc`-shared; `get` hands out a clone of the
/// stored `Arc` downcast to the requested type.
#[derive(Default)]
pub struct AttributeMap {
    inner: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl AttributeMap {
    /// Stores `value` under `key`, replacing any previous value.
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.inner.write().insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` downcast to `T`.
    ///
    /// `None` if the key is absent or holds a different type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.inner.read().get(key).cloned()?;
        value.downcast().ok()
    }

    /// Returns whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Removes the value under `key`, returning whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.write().remove(key).is_some()
    }
}

impl std::fmt::Debug for AttributeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.inner.read().keys().cloned().collect();
        f.debug_struct("AttributeMap").field("keys", &keys).finish()
    }
}
