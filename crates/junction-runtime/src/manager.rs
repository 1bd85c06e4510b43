//! Bot managers.
//!
//! A [`BotManager`] owns the bots of one platform/connector and maps bot
//! id → [`Bot`]. Managers form a tree: applications create one
//! [`origin`](BotManager::origin) root (which holds no bots itself) and
//! hang a child manager off it per connector. Cancellation flows down
//! the tree — cancelling a manager cancels its child managers and every
//! bot under them, through nested cancellation scopes.
//!
//! The manager tree is an explicit object graph handed to whoever
//! assembles the application; there is no process-wide singleton.

use std::collections::HashMap;
use std::sync::Arc;

use junction_core::EventProcessor;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bot::Bot;
use crate::error::{RuntimeError, RuntimeResult};

/// A node in the manager tree.
///
/// Cheap to clone; clones share the same registry and scope.
#[derive(Clone)]
pub struct BotManager {
    shared: Arc<ManagerShared>,
}

pub(crate) struct ManagerShared {
    name: String,
    parent: Option<BotManager>,
    processor: EventProcessor,
    bots: RwLock<HashMap<String, Bot>>,
    token: CancellationToken,
}

impl BotManager {
    /// Creates the root manager.
    ///
    /// The origin holds no bots itself; it exists to own the shared
    /// processor reference and the root cancellation scope.
    pub fn origin(processor: EventProcessor) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                name: "origin".to_owned(),
                parent: None,
                processor,
                bots: RwLock::new(HashMap::new()),
                token: CancellationToken::new(),
            }),
        }
    }

    /// Creates a child manager whose scope nests inside this one.
    pub fn child(&self, name: impl Into<String>) -> BotManager {
        let name = name.into();
        debug!(manager = %name, parent = %self.shared.name, "Created child manager");
        Self {
            shared: Arc::new(ManagerShared {
                name,
                parent: Some(self.clone()),
                processor: self.shared.processor.clone(),
                bots: RwLock::new(HashMap::new()),
                token: self.shared.token.child_token(),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<ManagerShared>) -> Self {
        Self { shared }
    }

    /// The manager's name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The parent manager, `None` for the origin.
    pub fn parent(&self) -> Option<&BotManager> {
        self.shared.parent.as_ref()
    }

    /// Returns whether this is the root manager.
    pub fn is_origin(&self) -> bool {
        self.shared.parent.is_none()
    }

    /// The shared event processor bots under this manager push into.
    pub fn processor(&self) -> &EventProcessor {
        &self.shared.processor
    }

    /// Registers a new bot under this manager.
    ///
    /// The bot's cancellation scope nests inside the manager's. Fails on
    /// a duplicate id, and always on the origin manager.
    pub fn register_bot(&self, id: impl Into<String>) -> RuntimeResult<Bot> {
        if self.is_origin() {
            return Err(RuntimeError::OriginHoldsNoBots);
        }
        let id = id.into();

        let mut bots = self.shared.bots.write();
        if bots.contains_key(&id) {
            return Err(RuntimeError::BotExists(id));
        }

        let bot = Bot::new(
            id.clone(),
            Arc::downgrade(&self.shared),
            self.shared.processor.clone(),
            self.shared.token.child_token(),
        );
        bots.insert(id.clone(), bot.clone());
        info!(bot = %id, manager = %self.shared.name, "Registered bot");
        Ok(bot)
    }

    /// Removes and cancels the bot with the given id.
    pub fn unregister_bot(&self, id: &str) -> RuntimeResult<()> {
        let removed = self.shared.bots.write().remove(id);
        match removed {
            Some(bot) => {
                bot.cancel();
                info!(bot = %id, manager = %self.shared.name, "Unregistered bot");
                Ok(())
            }
            None => Err(RuntimeError::BotNotFound(id.to_owned())),
        }
    }

    /// Looks up a bot by id.
    pub fn get(&self, id: &str) -> Option<Bot> {
        self.shared.bots.read().get(id).cloned()
    }

    /// All bots currently registered with this manager.
    pub fn bots(&self) -> Vec<Bot> {
        self.shared.bots.read().values().cloned().collect()
    }

    /// All registered bot ids.
    pub fn ids(&self) -> Vec<String> {
        self.shared.bots.read().keys().cloned().collect()
    }

    /// Number of bots registered with this manager.
    pub fn count(&self) -> usize {
        self.shared.bots.read().len()
    }

    /// Cancels this manager's scope.
    ///
    /// Every bot registered here and every descendant manager (and its
    /// bots) is cancelled through the nested scopes.
    pub fn cancel(&self) {
        info!(manager = %self.shared.name, "Cancelling manager scope");
        self.shared.token.cancel();
    }

    /// Waits until this manager's scope is cancelled.
    pub async fn join(&self) {
        self.shared.token.cancelled().await;
    }

    /// Returns whether this manager's scope has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }
}

impl std::fmt::Debug for BotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotManager")
            .field("name", &self.shared.name)
            .field("bots", &self.count())
            .field("is_origin", &self.is_origin())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotState;

    fn origin() -> BotManager {
        BotManager::origin(EventProcessor::new())
    }

    #[test]
    fn origin_refuses_bots() {
        let origin = origin();
        assert!(matches!(
            origin.register_bot("bot-1"),
            Err(RuntimeError::OriginHoldsNoBots)
        ));
        assert!(origin.is_origin());
        assert_eq!(origin.count(), 0);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let manager = origin().child("platform");
        manager.register_bot("bot-1").unwrap();
        assert!(matches!(
            manager.register_bot("bot-1"),
            Err(RuntimeError::BotExists(id)) if id == "bot-1"
        ));
    }

    #[test]
    fn lookup_and_enumeration() {
        let manager = origin().child("platform");
        manager.register_bot("a").unwrap();
        manager.register_bot("b").unwrap();

        assert_eq!(manager.count(), 2);
        assert!(manager.get("a").is_some());
        assert!(manager.get("missing").is_none());

        let mut ids = manager.ids();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn unregister_cancels_the_bot() {
        let manager = origin().child("platform");
        let bot = manager.register_bot("a").unwrap();
        bot.start();

        manager.unregister_bot("a").unwrap();
        assert_eq!(bot.state(), BotState::Cancelled);
        assert!(manager.get("a").is_none());

        assert!(matches!(
            manager.unregister_bot("a"),
            Err(RuntimeError::BotNotFound(_))
        ));
    }

    #[test]
    fn cancellation_flows_down_the_tree() {
        let origin = origin();
        let platform = origin.child("platform");
        let nested = platform.child("shard-1");
        let bot = nested.register_bot("bot-1").unwrap();
        bot.start();

        origin.cancel();

        assert!(platform.is_cancelled());
        assert!(nested.is_cancelled());
        assert_eq!(bot.state(), BotState::Cancelled);
    }

    #[test]
    fn sibling_scopes_are_independent() {
        let origin = origin();
        let left = origin.child("left");
        let right = origin.child("right");
        let left_bot = left.register_bot("l").unwrap();
        let right_bot = right.register_bot("r").unwrap();
        left_bot.start();
        right_bot.start();

        left.cancel();

        assert_eq!(left_bot.state(), BotState::Cancelled);
        assert_eq!(right_bot.state(), BotState::Started);
        assert!(!origin.is_cancelled());
    }

    #[test]
    fn bots_hold_a_backreference() {
        let manager = origin().child("platform");
        let bot = manager.register_bot("bot-1").unwrap();
        assert_eq!(bot.manager().unwrap().name(), "platform");
    }
}
