//! # Junction
//!
//! A multi-tenant, subtype-aware event bus for chat-bot connections.
//!
//! ## Overview
//!
//! Many independent bot connections — one per messaging platform — feed
//! inbound events into one shared dispatch engine. Each push runs a
//! prioritized, interceptable chain of listeners and aggregates their
//! results; listener failures are isolated, infrastructure failures
//! propagate, and cancelling a bot resolves its in-flight pushes with a
//! cancellation signal.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────────┐
//! │ Bot (conn A) │────▶│                │────▶│ dispatch interceptors│
//! ├──────────────┤     │ EventProcessor │     │  └ listeners by prio │
//! │ Bot (conn B) │────▶│    (shared)    │     │     └ results        │
//! └──────────────┘     └────────────────┘     └──────────────────────┘
//! ```
//!
//! - **Connectors**: platform wrappers; they construct events and own a
//!   [`Bot`](junction_runtime::Bot)'s lifecycle
//! - **Managers**: per-connector bot registries in a tree rooted at the
//!   origin
//! - **Listeners**: prioritized units of handling logic with
//!   subtype-aware targeting
//! - **Interceptors / preparers**: infrastructure wrapped around a push
//!   or a single listener segment
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use junction::prelude::*;
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
//!     let origin = BotManager::origin(processor.clone());
//!     let bot = origin.child("my-platform").register_bot("bot-1")?;
//!     bot.start();
//!
//!     let event = BoxedEvent::new(PlainEvent::new("e-1", message).from_bot("bot-1"));
//!     let outcome = bot.push(event).await?;
//!     assert_eq!(outcome.len(), 1);
//!     Ok(())
//! }
//! ```

pub use junction_core as core;
pub use junction_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use junction::prelude::*;
/// ```
pub mod prelude {
    // Dispatch engine
    pub use junction_core::{
        BoxedEvent, Event, EventKey, EventProcessingContext, EventProcessingResult, EventProcessor,
        EventResult, PlainEvent,
    };

    // Listener construction
    pub use junction_core::{EventListener, FnListener, ListenerRegistry};

    // Interceptor infrastructure
    pub use junction_core::{
        DispatchInterceptor, EventPreparer, InterceptPoint, ListenerInterceptor,
    };

    // Connection lifecycle
    pub use junction_runtime::{Bot, BotManager, BotState};

    // Configuration and logging bootstrap
    pub use junction_runtime::config::{ConfigLoader, JunctionConfig, load_config};
    pub use junction_runtime::logging::init_from_config;
}
