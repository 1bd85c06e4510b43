//! Unified error types for the Junction core.
//!
//! Only *infrastructure* failures live here. A listener that returns an
//! error is not an infrastructure failure — the dispatcher recovers it
//! into a failure-flavored [`EventResult`](super::result::EventResult)
//! and keeps going. Interceptors and preparers are trusted
//! infrastructure, so their errors abort the push and surface to the
//! caller as a [`DispatchError`].

use thiserror::Error;

/// Errors that abort a push.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The owning bot's scope was cancelled while the push was in flight
    /// (or before it entered the dispatcher).
    #[error("push cancelled: bot '{bot}' scope shut down")]
    Cancelled {
        /// Id of the cancelled bot.
        bot: String,
    },

    /// A dispatch-level interceptor failed.
    #[error("dispatch interceptor '{id}' failed")]
    DispatchInterceptor {
        /// Id of the failing interceptor.
        id: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// A listener-level interceptor failed.
    #[error("listener interceptor '{id}' failed")]
    ListenerInterceptor {
        /// Id of the failing interceptor.
        id: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// A preparer hook failed.
    #[error("preparer '{id}' failed")]
    Preparer {
        /// Id of the failing preparer.
        id: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Creates a cancellation error for `bot`.
    pub fn cancelled(bot: impl Into<String>) -> Self {
        Self::Cancelled { bot: bot.into() }
    }

    /// Returns whether this is the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
