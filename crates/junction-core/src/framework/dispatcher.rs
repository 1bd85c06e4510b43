//! The event processor.
//!
//! [`EventProcessor`] is the shared dispatch engine every bot connection
//! feeds into. One `push` drives a single event end to end:
//!
//! 1. A fresh [`EventProcessingContext`] is built for the event.
//! 2. The dispatch-level interceptor chain runs; a short-circuit there
//!    is the push's sole result.
//! 3. A registry snapshot is iterated in priority order. Each listener's
//!    segment runs its own chain: `BeforeMatch` interceptors, the
//!    `prepare_match` hooks, the target-key check, the match predicate,
//!    `AfterMatch` interceptors, the `prepare_invoke` hooks, and finally
//!    the invocation. Non-invalid outcomes are appended in order.
//! 4. The collected results freeze into an [`EventProcessingResult`].
//!
//! Listener errors are recovered into failure-flavored results in place;
//! interceptor and preparer errors abort the push. Listeners marked
//! `is_async` are spawned fire-and-forget and contribute no synchronous
//! result.
//!
//! The processor holds no per-bot state. Pushes from different
//! connections interleave freely; within one push, listener execution is
//! strictly sequential.
//!
//! # Thread Safety
//!
//! `EventProcessor` is cheaply clonable and `Send + Sync`; clones share
//! the same registry and interceptor sets.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::foundation::context::EventProcessingContext;
use crate::foundation::error::DispatchResult;
use crate::foundation::event::BoxedEvent;
use crate::foundation::result::EventProcessingResult;
use crate::framework::interceptor::{
    DispatchChain, DispatchInterceptor, DispatchTerminal, EventPreparer, InterceptPoint,
    ListenerChain, ListenerInterceptor,
};
use crate::framework::listener::EventListener;
use crate::framework::registry::ListenerRegistry;

/// The central dispatch engine.
#[derive(Clone)]
pub struct EventProcessor {
    shared: Arc<ProcessorShared>,
}

struct ProcessorShared {
    registry: Arc<ListenerRegistry>,
    dispatch_interceptors: RwLock<Arc<Vec<Arc<dyn DispatchInterceptor>>>>,
    before_match: RwLock<Arc<Vec<Arc<dyn ListenerInterceptor>>>>,
    after_match: RwLock<Arc<Vec<Arc<dyn ListenerInterceptor>>>>,
    preparers: RwLock<Arc<Vec<Arc<dyn EventPreparer>>>>,
}

/// Copy-on-write insert keeping priority order with registration-order
/// ties (stable sort over the rebuilt vector).
fn insert_by_priority<T: ?Sized>(
    slot: &RwLock<Arc<Vec<Arc<T>>>>,
    item: Arc<T>,
    priority: impl Fn(&T) -> i32,
) {
    let mut guard = slot.write();
    let mut next: Vec<Arc<T>> = guard.iter().cloned().collect();
    next.push(item);
    next.sort_by_key(|entry| priority(entry));
    *guard = Arc::new(next);
}

impl EventProcessor {
    /// Creates a processor with its own empty listener registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ListenerRegistry::new()))
    }

    /// Creates a processor over an externally owned registry.
    pub fn with_registry(registry: Arc<ListenerRegistry>) -> Self {
        Self {
            shared: Arc::new(ProcessorShared {
                registry,
                dispatch_interceptors: RwLock::new(Arc::new(Vec::new())),
                before_match: RwLock::new(Arc::new(Vec::new())),
                after_match: RwLock::new(Arc::new(Vec::new())),
                preparers: RwLock::new(Arc::new(Vec::new())),
            }),
        }
    }

    /// The listener registry this processor dispatches over.
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.shared.registry
    }

    /// Registers a listener. Safe while pushes are in flight.
    pub fn register(&self, listener: impl EventListener + 'static) {
        self.shared.registry.register(listener);
    }

    /// Unregisters a listener by id; unknown ids are a no-op.
    pub fn unregister(&self, id: &str) -> bool {
        self.shared.registry.unregister(id)
    }

    /// Attaches a dispatch-level interceptor.
    pub fn add_dispatch_interceptor(&self, interceptor: impl DispatchInterceptor + 'static) {
        let interceptor: Arc<dyn DispatchInterceptor> = Arc::new(interceptor);
        insert_by_priority(&self.shared.dispatch_interceptors, interceptor, |i| {
            i.priority()
        });
    }

    /// Attaches a listener-level interceptor at its insertion point.
    pub fn add_listener_interceptor(&self, interceptor: impl ListenerInterceptor + 'static) {
        let interceptor: Arc<dyn ListenerInterceptor> = Arc::new(interceptor);
        let slot = match interceptor.point() {
            InterceptPoint::BeforeMatch => &self.shared.before_match,
            InterceptPoint::AfterMatch => &self.shared.after_match,
        };
        insert_by_priority(slot, interceptor, |i| i.priority());
    }

    /// Attaches a preparer; preparers run in registration order.
    pub fn add_preparer(&self, preparer: impl EventPreparer + 'static) {
        let mut guard = self.shared.preparers.write();
        let mut next: Vec<Arc<dyn EventPreparer>> = guard.iter().cloned().collect();
        next.push(Arc::new(preparer));
        *guard = Arc::new(next);
    }

    /// Pushes one event through the bus.
    ///
    /// Resolves to the aggregated processing result, or to the error of
    /// the interceptor/preparer that aborted the push. Listener failures
    /// never surface here; they are recorded as failure-flavored results.
    pub async fn push(&self, event: BoxedEvent) -> DispatchResult<EventProcessingResult> {
        debug!(event = %event.id(), key = event.key().id(), "Dispatching event");

        let ctx = Arc::new(EventProcessingContext::new(event));
        let interceptors = self.shared.dispatch_interceptors.read().clone();
        let terminal: Arc<dyn DispatchTerminal> = self.shared.clone();

        let outcome = DispatchChain::new(ctx, interceptors, terminal).proceed().await;
        match &outcome {
            Ok(result) => debug!(results = result.len(), "Dispatch complete"),
            Err(error) => warn!(error = %error, "Dispatch aborted"),
        }
        outcome
    }
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProcessor")
            .field("listeners", &self.shared.registry.len())
            .finish()
    }
}

#[async_trait]
impl DispatchTerminal for ProcessorShared {
    async fn run(
        &self,
        ctx: Arc<EventProcessingContext>,
    ) -> DispatchResult<EventProcessingResult> {
        let listeners = self.registry.snapshot();
        let before = self.before_match.read().clone();
        let after = self.after_match.read().clone();
        let preparers = self.preparers.read().clone();

        for entry in listeners.iter() {
            let chain = ListenerChain::new(
                Arc::clone(&ctx),
                Arc::clone(entry),
                Arc::clone(&before),
                Arc::clone(&after),
                Arc::clone(&preparers),
            );

            let outcome = chain.proceed().await?;
            if outcome.is_invalid() {
                trace!(listener = entry.id(), "Listener skipped");
                continue;
            }
            if let Some(fault) = outcome.listener_fault() {
                warn!(
                    listener = entry.id(),
                    error = %fault.error,
                    "Listener failed, continuing with next"
                );
            }
            ctx.push_result(outcome);
        }

        Ok(ctx.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::DispatchError;
    use crate::foundation::event::PlainEvent;
    use crate::foundation::key::EventKey;
    use crate::foundation::result::EventResult;
    use crate::framework::listener::FnListener;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn event(key: &EventKey) -> BoxedEvent {
        BoxedEvent::new(PlainEvent::new("e-1", key.clone()))
    }

    fn tagging_listener(id: &str, priority: i32) -> FnListener {
        let tag = id.to_owned();
        FnListener::builder(id)
            .priority(priority)
            .handle(move |_| {
                let tag = tag.clone();
                async move { Ok(EventResult::of(tag)) }
            })
            .build()
    }

    fn result_tags(result: &EventProcessingResult) -> Vec<String> {
        result
            .results()
            .iter()
            .map(|r| r.value::<String>().cloned().unwrap_or_else(|| "<fault>".into()))
            .collect()
    }

    #[tokio::test]
    async fn listeners_run_in_priority_order() {
        let processor = EventProcessor::new();
        processor.register(tagging_listener("third", 5));
        processor.register(tagging_listener("first", -5));
        processor.register(tagging_listener("second", 0));

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        assert_eq!(result_tags(&result), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn equal_priorities_keep_registration_order() {
        let processor = EventProcessor::new();
        processor.register(tagging_listener("a", 0));
        processor.register(tagging_listener("b", 0));
        processor.register(tagging_listener("c", 0));

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        assert_eq!(result_tags(&result), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn invalid_results_are_never_recorded() {
        let processor = EventProcessor::new();
        processor.register(
            FnListener::builder("quiet")
                .handle(|_| async { Ok(EventResult::invalid()) })
                .build(),
        );
        processor.register(tagging_listener("loud", 1));

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        assert_eq!(result_tags(&result), ["loud"]);
    }

    #[tokio::test]
    async fn subtype_targets_route_events() {
        // L1 targets text events only; L2 matches everything.
        let text = EventKey::new("text");
        let voice = EventKey::new("voice");

        let processor = EventProcessor::new();
        let l1 = FnListener::builder("l1")
            .priority(-10)
            .target(text.clone())
            .handle(|_| async { Ok(EventResult::of("l1".to_string())) })
            .build();
        processor.register(l1);
        processor.register(tagging_listener("l2", 0));

        let result = processor.push(event(&text)).await.unwrap();
        assert_eq!(result_tags(&result), ["l1", "l2"]);

        let result = processor.push(event(&voice)).await.unwrap();
        assert_eq!(result_tags(&result), ["l2"]);
    }

    #[tokio::test]
    async fn transitive_subtype_matches_with_warm_cache() {
        let message = EventKey::new("message");
        let group = EventKey::with_parents("message.group", [message.clone()]);

        let processor = EventProcessor::new();
        processor.register(
            FnListener::builder("messages")
                .target(message)
                .handle(|_| async { Ok(EventResult::of("hit".to_string())) })
                .build(),
        );

        // First push resolves through the parent graph, second through the
        // per-listener memo; outcomes must be identical.
        let cold = processor.push(event(&group)).await.unwrap();
        let warm = processor.push(event(&group)).await.unwrap();
        assert_eq!(result_tags(&cold), ["hit"]);
        assert_eq!(result_tags(&warm), ["hit"]);
    }

    #[tokio::test]
    async fn listener_failure_is_isolated() {
        let processor = EventProcessor::new();
        processor.register(
            FnListener::builder("broken")
                .priority(-1)
                .handle(|_| async { Err(anyhow::anyhow!("exploded")) })
                .build(),
        );
        processor.register(tagging_listener("healthy", 0));

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();

        assert_eq!(result.len(), 2);
        let fault = result.results()[0].listener_fault().unwrap();
        assert_eq!(fault.listener, "broken");
        assert_eq!(result.results()[1].value::<String>().unwrap(), "healthy");
    }

    #[tokio::test]
    async fn match_failure_is_isolated_too() {
        let processor = EventProcessor::new();

        struct ErroringMatch;

        #[async_trait]
        impl EventListener for ErroringMatch {
            fn id(&self) -> &str {
                "bad-match"
            }

            fn priority(&self) -> i32 {
                -1
            }

            async fn matches(&self, _ctx: &EventProcessingContext) -> anyhow::Result<bool> {
                Err(anyhow::anyhow!("cannot decide"))
            }

            async fn invoke(
                &self,
                _ctx: Arc<EventProcessingContext>,
            ) -> anyhow::Result<EventResult> {
                Ok(EventResult::empty())
            }
        }

        processor.register(ErroringMatch);
        processor.register(tagging_listener("healthy", 0));

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.results()[0].is_fault());
        assert_eq!(result.results()[1].value::<String>().unwrap(), "healthy");
    }

    struct ShortCircuit;

    #[async_trait]
    impl DispatchInterceptor for ShortCircuit {
        fn id(&self) -> &str {
            "short-circuit"
        }

        async fn intercept(
            &self,
            _chain: DispatchChain,
        ) -> DispatchResult<EventProcessingResult> {
            Ok(EventProcessingResult::new(vec![EventResult::of(
                "intercepted".to_string(),
            )]))
        }
    }

    #[tokio::test]
    async fn dispatch_interceptor_short_circuits_whole_push() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_probe = Arc::clone(&ran);

        let processor = EventProcessor::new();
        processor.register(
            FnListener::builder("never")
                .handle(move |_| {
                    let ran = Arc::clone(&ran_probe);
                    async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                        Ok(EventResult::empty())
                    }
                })
                .build(),
        );
        processor.add_dispatch_interceptor(ShortCircuit);

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();

        assert_eq!(result_tags(&result), ["intercepted"]);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    struct Recorder {
        name: &'static str,
        priority: i32,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl DispatchInterceptor for Recorder {
        fn id(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn intercept(&self, chain: DispatchChain) -> DispatchResult<EventProcessingResult> {
            self.log.lock().push(self.name);
            chain.proceed().await
        }
    }

    #[tokio::test]
    async fn dispatch_interceptors_run_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let processor = EventProcessor::new();
        processor.add_dispatch_interceptor(Recorder {
            name: "inner",
            priority: 10,
            log: Arc::clone(&log),
        });
        processor.add_dispatch_interceptor(Recorder {
            name: "outer",
            priority: -10,
            log: Arc::clone(&log),
        });

        let key = EventKey::new("message");
        processor.push(event(&key)).await.unwrap();
        assert_eq!(*log.lock(), ["outer", "inner"]);
    }

    struct FailingInterceptor;

    #[async_trait]
    impl DispatchInterceptor for FailingInterceptor {
        fn id(&self) -> &str {
            "failing"
        }

        async fn intercept(
            &self,
            _chain: DispatchChain,
        ) -> DispatchResult<EventProcessingResult> {
            Err(DispatchError::DispatchInterceptor {
                id: "failing".to_owned(),
                source: anyhow::anyhow!("infrastructure down"),
            })
        }
    }

    #[tokio::test]
    async fn interceptor_error_aborts_push() {
        let processor = EventProcessor::new();
        processor.register(tagging_listener("unreached", 0));
        processor.add_dispatch_interceptor(FailingInterceptor);

        let key = EventKey::new("message");
        let error = processor.push(event(&key)).await.unwrap_err();
        assert!(matches!(error, DispatchError::DispatchInterceptor { .. }));
    }

    struct ReplaceListener {
        victim: &'static str,
    }

    #[async_trait]
    impl ListenerInterceptor for ReplaceListener {
        fn id(&self) -> &str {
            "replace"
        }

        async fn intercept(&self, chain: ListenerChain) -> DispatchResult<EventResult> {
            if chain.listener().id() == self.victim {
                return Ok(EventResult::of("replaced".to_string()));
            }
            chain.proceed().await
        }
    }

    #[tokio::test]
    async fn before_match_short_circuit_stands_in_for_listener() {
        let processor = EventProcessor::new();
        processor.register(tagging_listener("victim", -1));
        processor.register(tagging_listener("bystander", 0));
        processor.add_listener_interceptor(ReplaceListener { victim: "victim" });

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        // Replacement occupies the victim's position; the push continues.
        assert_eq!(result_tags(&result), ["replaced", "bystander"]);
    }

    struct MuteListener {
        victim: &'static str,
    }

    #[async_trait]
    impl ListenerInterceptor for MuteListener {
        fn id(&self) -> &str {
            "mute"
        }

        async fn intercept(&self, chain: ListenerChain) -> DispatchResult<EventResult> {
            if chain.listener().id() == self.victim {
                return Ok(EventResult::invalid());
            }
            chain.proceed().await
        }
    }

    #[tokio::test]
    async fn short_circuit_with_invalid_records_nothing() {
        let processor = EventProcessor::new();
        processor.register(tagging_listener("victim", -1));
        processor.register(tagging_listener("bystander", 0));
        processor.add_listener_interceptor(MuteListener { victim: "victim" });

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        assert_eq!(result_tags(&result), ["bystander"]);
    }

    struct AfterMatchCounter {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ListenerInterceptor for AfterMatchCounter {
        fn id(&self) -> &str {
            "after-counter"
        }

        fn point(&self) -> InterceptPoint {
            InterceptPoint::AfterMatch
        }

        async fn intercept(&self, chain: ListenerChain) -> DispatchResult<EventResult> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            chain.proceed().await
        }
    }

    #[tokio::test]
    async fn after_match_runs_only_for_matching_listeners() {
        let text = EventKey::new("text");
        let voice = EventKey::new("voice");
        let seen = Arc::new(AtomicUsize::new(0));

        let processor = EventProcessor::new();
        processor.register(
            FnListener::builder("text-only")
                .target(text.clone())
                .handle(|_| async { Ok(EventResult::empty()) })
                .build(),
        );
        processor.add_listener_interceptor(AfterMatchCounter {
            seen: Arc::clone(&seen),
        });

        processor.push(event(&voice)).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        processor.push(event(&text)).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    struct TrimPreparer;

    #[async_trait]
    impl EventPreparer for TrimPreparer {
        fn id(&self) -> &str {
            "trim"
        }

        async fn prepare_match(&self, ctx: &EventProcessingContext) -> anyhow::Result<()> {
            ctx.attributes().put("trimmed", "hello".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn preparer_mutation_is_visible_to_listeners() {
        let processor = EventProcessor::new();
        processor.add_preparer(TrimPreparer);
        processor.register(
            FnListener::builder("reader")
                .check(|ctx| ctx.attributes().contains("trimmed"))
                .handle(|ctx| async move {
                    let trimmed = ctx.attributes().get::<String>("trimmed").unwrap();
                    Ok(EventResult::of(trimmed.as_str().to_owned()))
                })
                .build(),
        );

        let key = EventKey::new("message");
        let result = processor.push(event(&key)).await.unwrap();
        assert_eq!(result_tags(&result), ["hello"]);
    }

    struct BrokenPreparer;

    #[async_trait]
    impl EventPreparer for BrokenPreparer {
        fn id(&self) -> &str {
            "broken-preparer"
        }

        async fn prepare_match(&self, _ctx: &EventProcessingContext) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("cannot prepare"))
        }
    }

    #[tokio::test]
    async fn preparer_error_aborts_push() {
        let processor = EventProcessor::new();
        processor.add_preparer(BrokenPreparer);
        processor.register(tagging_listener("unreached", 0));

        let key = EventKey::new("message");
        let error = processor.push(event(&key)).await.unwrap_err();
        assert!(matches!(error, DispatchError::Preparer { .. }));
    }

    #[tokio::test]
    async fn detached_listener_does_not_delay_push() {
        let finished = Arc::new(tokio::sync::Notify::new());
        let finished_tx = Arc::clone(&finished);

        let processor = EventProcessor::new();
        processor.register(
            FnListener::builder("slow-detached")
                .priority(-1)
                .asynchronous(true)
                .handle(move |_| {
                    let finished = Arc::clone(&finished_tx);
                    async move {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        finished.notify_one();
                        Ok(EventResult::of("late".to_string()))
                    }
                })
                .build(),
        );
        processor.register(tagging_listener("fast", 0));

        let key = EventKey::new("message");
        let started = Instant::now();
        let result = processor.push(event(&key)).await.unwrap();
        let elapsed = started.elapsed();

        // Only the synchronous listener contributes, and the push does
        // not wait out the detached sleep.
        assert_eq!(result_tags(&result), ["fast"]);
        assert!(elapsed < Duration::from_millis(400), "push took {elapsed:?}");

        // The detached invocation still completes eventually.
        finished.notified().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn registration_is_safe_during_concurrent_pushes() {
        let processor = EventProcessor::new();
        processor.register(tagging_listener("base", 0));

        let key = EventKey::new("message");
        let mut pushes = Vec::new();
        for i in 0..100 {
            let processor = processor.clone();
            let key = key.clone();
            pushes.push(tokio::spawn(async move {
                let event = BoxedEvent::new(PlainEvent::new(format!("e-{i}"), key));
                processor.push(event).await
            }));
        }

        for i in 0..20 {
            let id = format!("extra-{i}");
            processor.register(tagging_listener(&id, i));
        }
        processor.unregister("extra-0");

        for push in pushes {
            let result = push.await.unwrap().unwrap();
            // Every push saw a consistent snapshot: at least the base
            // listener, never a torn registry.
            assert!(!result.is_empty());
        }
    }
}
