//! Managed bot connections.
//!
//! A [`Bot`] represents one platform connection feeding the shared
//! [`EventProcessor`]. It owns a monotonic lifecycle state machine
//! (Init → Started → Cancelled, no reverse transitions) and a
//! cancellation scope independent of the dispatcher: cancelling a bot
//! resolves that bot's in-flight pushes with a cancellation signal and
//! fails all later ones fast, without touching other bots' pushes.
//!
//! Connectors wrap a `Bot`: they drive its lifecycle (`start` / `join` /
//! `cancel`), construct events when platform traffic arrives, and hand
//! them to [`Bot::push`].

use std::sync::{Arc, Weak};

use junction_core::{BoxedEvent, DispatchError, DispatchResult, EventProcessingResult, EventProcessor};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::manager::{BotManager, ManagerShared};

/// Lifecycle state of a bot connection.
///
/// Transitions are monotonic: once `Cancelled`, a bot never runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    /// Created, not yet started.
    Init,
    /// Running; events may flow.
    Started,
    /// Terminal. The cancellation scope has been shut down.
    Cancelled,
}

impl std::fmt::Display for BotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::Started => write!(f, "Started"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A managed bot connection.
///
/// Cheap to clone; clones share the same lifecycle and scope.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

struct BotInner {
    id: String,
    manager: Weak<ManagerShared>,
    processor: EventProcessor,
    state: Mutex<BotState>,
    token: CancellationToken,
}

impl Bot {
    pub(crate) fn new(
        id: String,
        manager: Weak<ManagerShared>,
        processor: EventProcessor,
        token: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(BotInner {
                id,
                manager,
                processor,
                state: Mutex::new(BotState::Init),
                token,
            }),
        }
    }

    /// The bot's unique identifier.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The manager this bot is registered with, if it still exists.
    pub fn manager(&self) -> Option<BotManager> {
        self.inner.manager.upgrade().map(BotManager::from_shared)
    }

    /// The current lifecycle state.
    ///
    /// A scope cancelled from above (manager shutdown) reads as
    /// `Cancelled` even if [`cancel`](Self::cancel) was never called on
    /// this bot directly.
    pub fn state(&self) -> BotState {
        if self.inner.token.is_cancelled() {
            return BotState::Cancelled;
        }
        *self.inner.state.lock()
    }

    /// Starts the bot.
    ///
    /// Init → Started; idempotent when already started. Returns whether
    /// the bot is running after the call — `false` means the bot was
    /// already cancelled (there is no way back).
    pub fn start(&self) -> bool {
        if self.inner.token.is_cancelled() {
            return false;
        }
        let mut state = self.inner.state.lock();
        match *state {
            BotState::Init => {
                *state = BotState::Started;
                info!(bot = %self.inner.id, "Bot started");
                true
            }
            BotState::Started => true,
            BotState::Cancelled => false,
        }
    }

    /// Cancels the bot. Terminal and idempotent.
    ///
    /// Any push currently suspended inside a listener resolves with the
    /// cancellation signal; future pushes fail fast.
    pub fn cancel(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state == BotState::Cancelled {
                return;
            }
            *state = BotState::Cancelled;
        }
        self.inner.token.cancel();
        info!(bot = %self.inner.id, "Bot cancelled");
    }

    /// Waits until the bot is cancelled.
    pub async fn join(&self) {
        self.inner.token.cancelled().await;
    }

    /// Returns whether the bot's scope has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state() == BotState::Cancelled
    }

    /// The bot's cancellation scope, for connectors that spawn their own
    /// I/O tasks and want them tied to the bot's lifetime.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Pushes one of this bot's events through the shared dispatcher.
    ///
    /// Resolves with the processing result, a propagated infrastructure
    /// error, or [`DispatchError::Cancelled`] — never silent loss. The
    /// dispatch is raced against this bot's scope, so cancellation
    /// interrupts even a push suspended inside a slow listener.
    pub async fn push(&self, event: BoxedEvent) -> DispatchResult<EventProcessingResult> {
        if self.inner.token.is_cancelled() {
            debug!(bot = %self.inner.id, event = %event.id(), "Push refused, bot cancelled");
            return Err(DispatchError::cancelled(self.inner.id.as_str()));
        }

        tokio::select! {
            _ = self.inner.token.cancelled() => {
                Err(DispatchError::cancelled(self.inner.id.as_str()))
            }
            result = self.inner.processor.push(event) => result,
        }
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}
