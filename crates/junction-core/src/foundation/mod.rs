//! Foundation layer: event model, type keys, results, per-push context,
//! and the core error taxonomy.

pub mod context;
pub mod error;
pub mod event;
pub mod key;
pub mod result;

pub use context::{AttributeMap, EventProcessingContext};
pub use error::{DispatchError, DispatchResult};
pub use event::{BoxedEvent, Event, EventId, EventMetadata, PlainEvent, now_millis};
pub use key::EventKey;
pub use result::{EventProcessingResult, EventResult, ListenerFault};
