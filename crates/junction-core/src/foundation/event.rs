//! Event model for the Junction bus.
//!
//! This module provides the core event infrastructure:
//!
//! - [`Event`] - Base trait for all events flowing through the bus
//! - [`EventId`] / [`EventMetadata`] - Primary and secondary identities
//! - [`BoxedEvent`] - Type-erased, cheaply clonable event handle
//! - [`PlainEvent`] - Ready-made concrete event for connectors and tests
//!
//! Connectors construct an event when a platform message or signal
//! arrives, hand it to the dispatcher, and never touch it again: events
//! are immutable once built. Routing decisions are made from the event's
//! [`EventKey`](super::key::EventKey), not its concrete Rust type, so a
//! connector can ship arbitrarily rich payload structs and still
//! participate in subtype-aware listener matching.

use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::key::EventKey;

/// Opaque, comparable event identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(String);

impl EventId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secondary event identity.
///
/// The metadata id is the de-duplication handle: two deliveries of the
/// same platform message may carry distinct [`EventId`]s but share a
/// metadata id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventMetadata {
    id: EventId,
}

impl EventMetadata {
    /// Creates metadata with the given de-duplication id.
    pub fn new(id: impl Into<EventId>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the de-duplication id.
    pub fn id(&self) -> &EventId {
        &self.id
    }
}

/// Returns the current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The base trait for all events on the bus.
///
/// Events are type-erased as `dyn Event` during dispatch and can be
/// downcast to concrete types via [`Event::as_any`]. Implementations are
/// expected to be immutable value carriers.
pub trait Event: Any + Send + Sync {
    /// Returns the event's unique identifier.
    fn id(&self) -> &EventId;

    /// Returns the event's type key, used for subtype-aware routing.
    fn key(&self) -> &EventKey;

    /// Returns the event time as Unix epoch milliseconds.
    fn timestamp(&self) -> i64;

    /// Returns the id of the owning bot connection, if any.
    fn bot(&self) -> Option<&str> {
        None
    }

    /// Returns the event's secondary identity.
    fn metadata(&self) -> &EventMetadata;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` wraps any [`Event`] in an `Arc`, allowing it to pass
/// through the dispatcher and into detached listener tasks without
/// knowing its concrete type.
///
/// Implements `Deref<Target = dyn Event>`, so trait methods can be called
/// directly:
///
/// ```rust,ignore
/// let event: BoxedEvent = /* ... */;
/// let key = event.key();
/// let when = event.timestamp();
/// ```
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event + 'static>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event + 'static>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }
}

impl Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("id", self.id())
            .field("key", &self.key().id())
            .field("bot", &self.bot())
            .finish()
    }
}

/// A generic concrete event.
///
/// Connectors that need no bespoke payload struct (and tests) can build
/// one of these directly; richer connectors implement [`Event`] on their
/// own types. The optional payload is type-erased and recovered with
/// [`PlainEvent::payload`].
pub struct PlainEvent {
    id: EventId,
    key: EventKey,
    timestamp: i64,
    bot: Option<String>,
    metadata: EventMetadata,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl PlainEvent {
    /// Creates an event with the given id and key, timestamped now.
    ///
    /// The metadata id defaults to the event id.
    pub fn new(id: impl Into<EventId>, key: EventKey) -> Self {
        let id = id.into();
        Self {
            metadata: EventMetadata::new(id.clone()),
            id,
            key,
            timestamp: now_millis(),
            bot: None,
            payload: None,
        }
    }

    /// Sets the owning bot connection id.
    pub fn from_bot(mut self, bot: impl Into<String>) -> Self {
        self.bot = Some(bot.into());
        self
    }

    /// Overrides the event timestamp (epoch millis).
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Overrides the de-duplication metadata.
    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches an arbitrary payload value.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Returns the payload downcast to `T`, if present and of that type.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }
}

impl Event for PlainEvent {
    fn id(&self) -> &EventId {
        &self.id
    }

    fn key(&self) -> &EventKey {
        &self.key
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn bot(&self) -> Option<&str> {
        self.bot.as_deref()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for PlainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainEvent")
            .field("id", &self.id)
            .field("key", &self.key.id())
            .field("bot", &self.bot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_event_defaults() {
        let key = EventKey::new("message");
        let event = PlainEvent::new("e-1", key.clone());

        assert_eq!(event.id().as_str(), "e-1");
        assert_eq!(event.key(), &key);
        assert_eq!(event.metadata().id().as_str(), "e-1");
        assert!(event.bot().is_none());
        assert!(event.timestamp() > 0);
    }

    #[test]
    fn boxed_event_downcasts() {
        let event = PlainEvent::new("e-2", EventKey::new("message")).with_payload(42u32);
        let boxed = BoxedEvent::new(event);

        let concrete = boxed.downcast_ref::<PlainEvent>().unwrap();
        assert_eq!(concrete.payload::<u32>(), Some(&42));
    }

    #[test]
    fn metadata_is_separate_identity() {
        let event = PlainEvent::new("delivery-9", EventKey::new("message"))
            .with_metadata(EventMetadata::new("msg-1"));
        assert_eq!(event.id().as_str(), "delivery-9");
        assert_eq!(event.metadata().id().as_str(), "msg-1");
    }
}
