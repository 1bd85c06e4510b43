//! Listener contract and closure-based construction.
//!
//! An [`EventListener`] is a registered unit of logic: a match predicate
//! plus an invoke action, executed in priority order per push. Most
//! applications build listeners from closures via [`ListenerBuilder`];
//! anything more stateful implements the trait directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use junction_core::{EventKey, EventResult, FnListener};
//!
//! let message = EventKey::new("message");
//! let echo = FnListener::builder("echo")
//!     .priority(-10)
//!     .target(message)
//!     .handle(|ctx| async move {
//!         Ok(EventResult::of(format!("saw {}", ctx.event().id())))
//!     })
//!     .build();
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::context::EventProcessingContext;
use crate::foundation::key::EventKey;
use crate::foundation::result::EventResult;

/// A boxed future, the erased type closure-built listeners store.
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;

/// A registered unit of event-handling logic.
///
/// Listeners are arbitrary user code: errors returned from [`matches`]
/// or [`invoke`] are recovered by the dispatcher into failure-flavored
/// results and never abort the push.
///
/// [`matches`]: EventListener::matches
/// [`invoke`]: EventListener::invoke
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Unique listener id.
    fn id(&self) -> &str;

    /// Execution priority; lower runs first. Ties run in registration
    /// order.
    fn priority(&self) -> i32 {
        0
    }

    /// Event-type keys this listener targets. Empty means every event.
    ///
    /// An event matches when its key is a subtype of any target
    /// (transitively, via the key parent graph).
    fn targets(&self) -> &[EventKey] {
        &[]
    }

    /// Whether invocation is fire-and-forget.
    ///
    /// A detached listener is spawned onto the runtime and never awaited
    /// by the push; its eventual result is not recorded.
    fn is_async(&self) -> bool {
        false
    }

    /// Fine-grained match predicate, consulted after the target-key check
    /// passes. Returning `false` skips this listener with no result.
    async fn matches(&self, ctx: &EventProcessingContext) -> anyhow::Result<bool> {
        let _ = ctx;
        Ok(true)
    }

    /// Handles the event.
    ///
    /// Receives the shared per-push context so detached invocations can
    /// outlive the push that spawned them.
    async fn invoke(&self, ctx: Arc<EventProcessingContext>) -> anyhow::Result<EventResult>;
}

/// A type-erased match predicate.
type CheckFn = Arc<dyn Fn(&EventProcessingContext) -> bool + Send + Sync>;

/// A type-erased invoke action.
type InvokeFn =
    Arc<dyn Fn(Arc<EventProcessingContext>) -> BoxFuture<'static, anyhow::Result<EventResult>> + Send + Sync>;

/// An [`EventListener`] assembled from closures.
pub struct FnListener {
    id: String,
    priority: i32,
    targets: Vec<EventKey>,
    is_async: bool,
    check: Option<CheckFn>,
    invoke: InvokeFn,
}

impl FnListener {
    /// Starts building a listener with the given id.
    pub fn builder(id: impl Into<String>) -> ListenerBuilder {
        ListenerBuilder::new(id)
    }
}

#[async_trait]
impl EventListener for FnListener {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn targets(&self) -> &[EventKey] {
        &self.targets
    }

    fn is_async(&self) -> bool {
        self.is_async
    }

    async fn matches(&self, ctx: &EventProcessingContext) -> anyhow::Result<bool> {
        Ok(match &self.check {
            Some(check) => check(ctx),
            None => true,
        })
    }

    async fn invoke(&self, ctx: Arc<EventProcessingContext>) -> anyhow::Result<EventResult> {
        (self.invoke)(ctx).await
    }
}

impl std::fmt::Debug for FnListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnListener")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("targets", &self.targets.iter().map(EventKey::id).collect::<Vec<_>>())
            .field("is_async", &self.is_async)
            .finish()
    }
}

/// Builder for [`FnListener`].
pub struct ListenerBuilder {
    id: String,
    priority: i32,
    targets: Vec<EventKey>,
    is_async: bool,
    check: Option<CheckFn>,
    invoke: Option<InvokeFn>,
}

impl ListenerBuilder {
    /// Creates a builder for a listener with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            targets: Vec::new(),
            is_async: false,
            check: None,
            invoke: None,
        }
    }

    /// Sets the priority (lower runs first, default 0).
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a target key.
    pub fn target(mut self, key: EventKey) -> Self {
        self.targets.push(key);
        self
    }

    /// Adds several target keys.
    pub fn targets(mut self, keys: impl IntoIterator<Item = EventKey>) -> Self {
        self.targets.extend(keys);
        self
    }

    /// Marks the listener fire-and-forget.
    pub fn asynchronous(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the match predicate. A listener with no check matches every
    /// event that passes its target-key filter.
    pub fn check<F>(mut self, f: F) -> Self
    where
        F: Fn(&EventProcessingContext) -> bool + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(f));
        self
    }

    /// Sets the invoke action.
    pub fn handle<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<EventProcessingContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<EventResult>> + Send + 'static,
    {
        self.invoke = Some(Arc::new(move |ctx| Box::pin(f(ctx))));
        self
    }

    /// Finishes the listener. Without a [`handle`](Self::handle) action
    /// it invokes to an empty result.
    pub fn build(self) -> FnListener {
        FnListener {
            id: self.id,
            priority: self.priority,
            targets: self.targets,
            is_async: self.is_async,
            check: self.check,
            invoke: self
                .invoke
                .unwrap_or_else(|| Arc::new(|_| Box::pin(async { Ok(EventResult::empty()) }))),
        }
    }
}
