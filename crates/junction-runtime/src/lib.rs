//! # Junction Runtime
//!
//! Connection lifecycle and orchestration for the Junction event bus.
//!
//! This crate wraps the core dispatch engine with everything an
//! application assembling the bus needs:
//!
//! - **Bots** ([`Bot`]): one per platform connection, each with its own
//!   monotonic lifecycle and cancellation scope, all pushing into the
//!   one shared [`EventProcessor`](junction_core::EventProcessor).
//! - **Managers** ([`BotManager`]): a tree of per-connector bot
//!   registries rooted at a single origin; cancellation flows down.
//! - **Configuration** ([`config`]): TOML + environment loading via
//!   figment.
//! - **Logging** ([`logging`]): tracing-subscriber bootstrap.
//!
//! ## Example
//!
//! ```rust,ignore
//! use junction_core::{BoxedEvent, EventKey, EventProcessor, PlainEvent};
//! use junction_runtime::{BotManager, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let processor = EventProcessor::new();
//!     let origin = BotManager::origin(processor.clone());
//!     let manager = origin.child("my-platform");
//!
//!     let bot = manager.register_bot("bot-1")?;
//!     bot.start();
//!
//!     let message = EventKey::new("message");
//!     let event = BoxedEvent::new(PlainEvent::new("e-1", message).from_bot("bot-1"));
//!     let outcome = bot.push(event).await?;
//!     println!("{} result(s)", outcome.len());
//!
//!     bot.cancel();
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;

pub use bot::{Bot, BotState};
pub use config::{
    BotEntry, ConfigError, ConfigLoader, ConfigResult, JunctionConfig, LogFormat, LogLevel,
    LoggingConfig, load_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};
pub use manager::BotManager;
