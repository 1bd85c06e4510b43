//! Listener results and push aggregation.
//!
//! A listener invocation yields an [`EventResult`]. Three flavors exist:
//! a value result (optionally carrying a payload), a failure result
//! wrapping a [`ListenerFault`], and the distinguished [`invalid`]
//! sentinel meaning "ignore me" — the dispatcher never records an invalid
//! result, so [`EventProcessingResult`] contains only the other two.
//!
//! [`invalid`]: EventResult::invalid

use std::any::Any;
use std::sync::Arc;

/// The outcome of one listener invocation.
///
/// Clone is cheap: payloads and faults sit behind `Arc`s, so results can
/// be snapshotted into contexts and final processing results freely.
#[derive(Clone)]
pub struct EventResult {
    body: ResultBody,
}

#[derive(Clone)]
enum ResultBody {
    Value(Option<Arc<dyn Any + Send + Sync>>),
    Fault(Arc<ListenerFault>),
    Invalid,
}

impl EventResult {
    /// A successful result carrying `value`.
    pub fn of<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            body: ResultBody::Value(Some(Arc::new(value))),
        }
    }

    /// A successful result with no payload.
    pub fn empty() -> Self {
        Self {
            body: ResultBody::Value(None),
        }
    }

    /// The sentinel result: discarded by the dispatcher, never recorded.
    pub fn invalid() -> Self {
        Self {
            body: ResultBody::Invalid,
        }
    }

    /// A failure-flavored result for a listener that returned an error.
    pub fn fault(listener: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            body: ResultBody::Fault(Arc::new(ListenerFault {
                listener: listener.into(),
                error,
            })),
        }
    }

    /// Returns whether this is the sentinel.
    pub fn is_invalid(&self) -> bool {
        matches!(self.body, ResultBody::Invalid)
    }

    /// Returns whether this is a failure-flavored result.
    pub fn is_fault(&self) -> bool {
        matches!(self.body, ResultBody::Fault(_))
    }

    /// Returns the payload downcast to `T`, if this is a value result of
    /// that type.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        match &self.body {
            ResultBody::Value(Some(value)) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Returns the fault, if this is a failure-flavored result.
    pub fn listener_fault(&self) -> Option<&ListenerFault> {
        match &self.body {
            ResultBody::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl std::fmt::Debug for EventResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            ResultBody::Value(Some(_)) => f.write_str("EventResult::Value(..)"),
            ResultBody::Value(None) => f.write_str("EventResult::Empty"),
            ResultBody::Fault(fault) => write!(f, "EventResult::Fault({})", fault.listener),
            ResultBody::Invalid => f.write_str("EventResult::Invalid"),
        }
    }
}

/// A recovered listener failure.
///
/// Produced when a listener's `matches` or `invoke` returns an error; the
/// failure is recorded in place of a normal result and the push continues
/// with the next listener.
#[derive(Debug)]
pub struct ListenerFault {
    /// Id of the listener that failed.
    pub listener: String,
    /// The error it returned.
    pub error: anyhow::Error,
}

impl std::fmt::Display for ListenerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener '{}' failed: {}", self.listener, self.error)
    }
}

/// The immutable, ordered outcome of one push.
///
/// Contains every non-invalid result in listener execution order.
#[derive(Clone, Debug, Default)]
pub struct EventProcessingResult {
    results: Vec<EventResult>,
}

impl EventProcessingResult {
    /// Builds a processing result from collected listener results.
    pub fn new(results: Vec<EventResult>) -> Self {
        Self { results }
    }

    /// A processing result with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The collected results, in listener execution order.
    pub fn results(&self) -> &[EventResult] {
        &self.results
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns whether no results were recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over the recovered listener faults, if any.
    pub fn faults(&self) -> impl Iterator<Item = &ListenerFault> {
        self.results.iter().filter_map(EventResult::listener_fault)
    }
}
