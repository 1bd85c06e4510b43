//! # Junction Core
//!
//! The dispatch engine of the Junction event bus.
//!
//! Many independent bot connections feed inbound events into one shared
//! [`EventProcessor`]; each push runs a prioritized, interceptable chain
//! of listeners and aggregates their results.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Type keys**: subtype-aware event classification ([`EventKey`])
//! - **Event model**: type-erased immutable events ([`Event`],
//!   [`BoxedEvent`], [`PlainEvent`])
//! - **Results**: per-listener outcomes and push aggregation
//!   ([`EventResult`], [`EventProcessingResult`])
//! - **Context**: per-push scratch state ([`EventProcessingContext`],
//!   [`AttributeMap`])
//!
//! ### Framework Layer
//!
//! - **Listeners**: the handling contract and closure builder
//!   ([`EventListener`], [`FnListener`])
//! - **Registry**: copy-on-write, priority-ordered listener storage
//!   ([`ListenerRegistry`])
//! - **Interceptors**: onion-style chains at dispatch and listener level
//!   ([`DispatchInterceptor`], [`ListenerInterceptor`], [`EventPreparer`])
//! - **Dispatcher**: push orchestration ([`EventProcessor`])
//!
//! ## Data Flow
//!
//! ```text
//! ┌───────────┐     ┌────────────────┐     ┌───────────────────────┐
//! │    Bot    │────▶│ EventProcessor │────▶│ interceptors          │
//! │ (conn #n) │     │    (shared)    │     │  └ listeners (by prio)│
//! └───────────┘     └────────────────┘     │     └ results         │
//!                                          └───────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use junction_core::{BoxedEvent, EventKey, EventProcessor, EventResult, FnListener, PlainEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let message = EventKey::new("message");
//!
//!     let processor = EventProcessor::new();
//!     processor.register(
//!         FnListener::builder("echo")
//!             .target(message.clone())
//!             .handle(|ctx| async move {
//!                 Ok(EventResult::of(format!("saw {}", ctx.event().id())))
//!             })
//!             .build(),
//!     );
//!
//!     let event = BoxedEvent::new(PlainEvent::new("e-1", message));
//!     let outcome = processor.push(event).await?;
//!     assert_eq!(outcome.len(), 1);
//!     Ok(())
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;

// Re-export foundation types
pub use foundation::{
    AttributeMap, BoxedEvent, DispatchError, DispatchResult, Event, EventId, EventKey,
    EventMetadata, EventProcessingContext, EventProcessingResult, EventResult, ListenerFault,
    PlainEvent, now_millis,
};

// Re-export framework types
pub use framework::{
    BoxFuture, DispatchChain, DispatchInterceptor, EventListener, EventPreparer, EventProcessor,
    FnListener, InterceptPoint, ListenerBuilder, ListenerChain, ListenerInterceptor,
    ListenerRegistry, ListenerSnapshot, RegisteredListener,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{
        DispatchInterceptor, EventListener, EventPreparer, EventProcessor, FnListener,
        InterceptPoint, ListenerInterceptor, ListenerRegistry,
    };
}
