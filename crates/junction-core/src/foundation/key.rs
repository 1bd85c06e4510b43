//! Event type keys and subtype matching.
//!
//! Every event carries an [`EventKey`] describing its type. Keys form an
//! explicit multi-parent subtype graph: each key names its *direct*
//! supertypes only, and [`EventKey::is_sub_of`] walks the graph
//! transitively. Listeners that target `Message` therefore also receive
//! events keyed `Group` when `Group` lists `Message` among its parents.
//!
//! # Identity
//!
//! A key's identity is its `id` string alone. Two keys with the same id
//! compare equal even if their parent sets differ; the first registered
//! shape wins wherever keys are deduplicated.
//!
//! # Example
//!
//! ```rust,ignore
//! use junction_core::EventKey;
//!
//! let message = EventKey::new("message");
//! let group = EventKey::with_parents("message.group", [message.clone()]);
//!
//! assert!(group.is_sub_of(&message));
//! assert!(!message.is_sub_of(&group));
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Identity + direct-parent descriptor for an event type.
///
/// Cheap to clone: the id and parent list live behind one `Arc`.
#[derive(Clone)]
pub struct EventKey {
    inner: Arc<KeyInner>,
}

struct KeyInner {
    id: String,
    parents: Vec<EventKey>,
}

impl EventKey {
    /// Creates a root key with no supertypes.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_parents(id, [])
    }

    /// Creates a key with the given direct supertypes.
    ///
    /// The parent graph is expected to be acyclic; traversal guards
    /// against cycles anyway and treats them as "no match".
    pub fn with_parents(id: impl Into<String>, parents: impl IntoIterator<Item = EventKey>) -> Self {
        Self {
            inner: Arc::new(KeyInner {
                id: id.into(),
                parents: parents.into_iter().collect(),
            }),
        }
    }

    /// Returns the key's unique identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Returns the direct supertypes of this key (not transitive).
    pub fn parents(&self) -> &[EventKey] {
        &self.inner.parents
    }

    /// Returns whether `target` is this key or one of its transitive
    /// supertypes.
    ///
    /// Breadth-first walk over the parent graph; a visited set keeps the
    /// walk finite even on cyclic input.
    pub fn is_sub_of(&self, target: &EventKey) -> bool {
        if self == target {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&EventKey> = self.parents().iter().collect();

        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.id()) {
                continue;
            }
            if key == target {
                return true;
            }
            queue.extend(key.parents().iter());
        }

        false
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for EventKey {}

impl std::hash::Hash for EventKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl std::fmt::Debug for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventKey")
            .field("id", &self.inner.id)
            .field(
                "parents",
                &self.inner.parents.iter().map(EventKey::id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
