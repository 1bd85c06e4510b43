//! Interceptor chains and preparer hooks.
//!
//! Two chain levels share one execution model. An interceptor receives
//! the live chain object and may:
//!
//! - call [`proceed`](DispatchChain::proceed) and post-process what comes
//!   back, or
//! - skip `proceed` and return its own result, short-circuiting
//!   everything downstream.
//!
//! [`DispatchInterceptor`]s wrap an entire push; a short-circuit there
//! yields the push's sole processing result. [`ListenerInterceptor`]s
//! wrap a single listener's match+invoke segment at one of two insertion
//! points: [`InterceptPoint::BeforeMatch`] runs ahead of the listener's
//! match predicate, [`InterceptPoint::AfterMatch`] runs after a
//! successful match but before invocation. A short-circuit at either
//! point stands in for that one listener's result and the push moves on
//! to the next listener.
//!
//! Interceptors are trusted infrastructure: an error returned from one
//! aborts the whole push. Contrast with listeners, whose errors are
//! recovered in place.
//!
//! [`EventPreparer`]s are the non-intercepting sibling: always-run hooks
//! immediately before match and before invoke, for lightweight context
//! mutation only. They cannot short-circuit; their errors are
//! infrastructure faults.
//!
//! The chains are explicit index-stepping state objects rather than
//! nested closures; each `intercept` call is boxed, which keeps the
//! recursive future finite.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::foundation::context::EventProcessingContext;
use crate::foundation::error::{DispatchError, DispatchResult};
use crate::foundation::result::{EventProcessingResult, EventResult};
use crate::framework::listener::EventListener;
use crate::framework::registry::RegisteredListener;

/// Where a listener-level interceptor attaches within the listener
/// segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptPoint {
    /// Ahead of the listener's target check and match predicate.
    BeforeMatch,
    /// After a successful match, ahead of invocation.
    AfterMatch,
}

/// Wraps an entire push.
#[async_trait]
pub trait DispatchInterceptor: Send + Sync {
    /// Unique interceptor id (used in error reports and logs).
    fn id(&self) -> &str;

    /// Chain position; lower runs first (outermost). Ties run in
    /// registration order.
    fn priority(&self) -> i32 {
        0
    }

    /// Intercepts the push. Call `chain.proceed().await` to run the rest
    /// of the chain and the listener iteration; skip it to short-circuit.
    async fn intercept(&self, chain: DispatchChain) -> DispatchResult<EventProcessingResult>;
}

/// Wraps one listener's match+invoke segment.
#[async_trait]
pub trait ListenerInterceptor: Send + Sync {
    /// Unique interceptor id.
    fn id(&self) -> &str;

    /// Chain position within the insertion point; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Insertion point. All `BeforeMatch` interceptors complete before
    /// any `AfterMatch` one begins.
    fn point(&self) -> InterceptPoint {
        InterceptPoint::BeforeMatch
    }

    /// Intercepts the segment. `chain.proceed().await` continues toward
    /// the listener; returning without it stands in for the listener's
    /// result.
    async fn intercept(&self, chain: ListenerChain) -> DispatchResult<EventResult>;
}

/// Always-run, non-intercepting context mutation hook.
#[async_trait]
pub trait EventPreparer: Send + Sync {
    /// Unique preparer id.
    fn id(&self) -> &str;

    /// Runs immediately before the listener's match predicate.
    async fn prepare_match(&self, ctx: &EventProcessingContext) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Runs immediately before the listener's invocation.
    async fn prepare_invoke(&self, ctx: &EventProcessingContext) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }
}

/// The terminal action a fully-proceeded dispatch chain runs: the
/// processor's listener iteration.
#[async_trait]
pub(crate) trait DispatchTerminal: Send + Sync {
    async fn run(&self, ctx: Arc<EventProcessingContext>)
    -> DispatchResult<EventProcessingResult>;
}

/// Chain state for the dispatch level.
///
/// Consuming: `proceed` takes the chain by value, so an interceptor can
/// continue it at most once.
pub struct DispatchChain {
    ctx: Arc<EventProcessingContext>,
    interceptors: Arc<Vec<Arc<dyn DispatchInterceptor>>>,
    index: usize,
    terminal: Arc<dyn DispatchTerminal>,
}

impl DispatchChain {
    pub(crate) fn new(
        ctx: Arc<EventProcessingContext>,
        interceptors: Arc<Vec<Arc<dyn DispatchInterceptor>>>,
        terminal: Arc<dyn DispatchTerminal>,
    ) -> Self {
        Self {
            ctx,
            interceptors,
            index: 0,
            terminal,
        }
    }

    /// The per-push context.
    pub fn context(&self) -> &Arc<EventProcessingContext> {
        &self.ctx
    }

    /// Runs the remainder of the chain and the listener iteration,
    /// returning the processing result produced downstream.
    pub async fn proceed(self) -> DispatchResult<EventProcessingResult> {
        match self.interceptors.get(self.index) {
            Some(interceptor) => {
                let interceptor = Arc::clone(interceptor);
                let next = Self {
                    index: self.index + 1,
                    ..self
                };
                interceptor.intercept(next).await
            }
            None => {
                let terminal = Arc::clone(&self.terminal);
                terminal.run(self.ctx).await
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ChainStage {
    Before(usize),
    After(usize),
}

/// Chain state for one listener's match+invoke segment.
pub struct ListenerChain {
    ctx: Arc<EventProcessingContext>,
    entry: Arc<RegisteredListener>,
    before: Arc<Vec<Arc<dyn ListenerInterceptor>>>,
    after: Arc<Vec<Arc<dyn ListenerInterceptor>>>,
    preparers: Arc<Vec<Arc<dyn EventPreparer>>>,
    stage: ChainStage,
}

impl ListenerChain {
    pub(crate) fn new(
        ctx: Arc<EventProcessingContext>,
        entry: Arc<RegisteredListener>,
        before: Arc<Vec<Arc<dyn ListenerInterceptor>>>,
        after: Arc<Vec<Arc<dyn ListenerInterceptor>>>,
        preparers: Arc<Vec<Arc<dyn EventPreparer>>>,
    ) -> Self {
        Self {
            ctx,
            entry,
            before,
            after,
            preparers,
            stage: ChainStage::Before(0),
        }
    }

    /// The per-push context.
    pub fn context(&self) -> &Arc<EventProcessingContext> {
        &self.ctx
    }

    /// The listener whose segment is being intercepted.
    pub fn listener(&self) -> &Arc<dyn EventListener> {
        self.entry.listener()
    }

    /// Continues toward the listener.
    ///
    /// Returns the segment's outcome: the listener's result, a
    /// failure-flavored result if it errored, or the invalid sentinel
    /// when the listener was skipped (target/match miss) or detached.
    pub async fn proceed(mut self) -> DispatchResult<EventResult> {
        loop {
            match self.stage {
                ChainStage::Before(index) => {
                    if let Some(interceptor) = self.before.get(index) {
                        let interceptor = Arc::clone(interceptor);
                        self.stage = ChainStage::Before(index + 1);
                        return interceptor.intercept(self).await;
                    }

                    for preparer in self.preparers.iter() {
                        preparer.prepare_match(&self.ctx).await.map_err(|source| {
                            DispatchError::Preparer {
                                id: preparer.id().to_owned(),
                                source,
                            }
                        })?;
                    }

                    if !self.entry.is_target(self.ctx.event().key()) {
                        return Ok(EventResult::invalid());
                    }

                    match self.entry.listener().matches(&self.ctx).await {
                        Ok(true) => {}
                        Ok(false) => return Ok(EventResult::invalid()),
                        Err(error) => return Ok(EventResult::fault(self.entry.id(), error)),
                    }

                    self.stage = ChainStage::After(0);
                }
                ChainStage::After(index) => {
                    if let Some(interceptor) = self.after.get(index) {
                        let interceptor = Arc::clone(interceptor);
                        self.stage = ChainStage::After(index + 1);
                        return interceptor.intercept(self).await;
                    }

                    for preparer in self.preparers.iter() {
                        preparer.prepare_invoke(&self.ctx).await.map_err(|source| {
                            DispatchError::Preparer {
                                id: preparer.id().to_owned(),
                                source,
                            }
                        })?;
                    }

                    if self.entry.listener().is_async() {
                        let listener = Arc::clone(self.entry.listener());
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            if let Err(error) = listener.invoke(ctx).await {
                                warn!(
                                    listener = listener.id(),
                                    error = %error,
                                    "Detached listener failed"
                                );
                            }
                        });
                        return Ok(EventResult::invalid());
                    }

                    return match self.entry.listener().invoke(Arc::clone(&self.ctx)).await {
                        Ok(result) => Ok(result),
                        Err(error) => Ok(EventResult::fault(self.entry.id(), error)),
                    };
                }
            }
        }
    }
}
