//! Framework layer: listener contract, registry, interceptor chains, and
//! the event processor.

pub mod dispatcher;
pub mod interceptor;
pub mod listener;
pub mod registry;

pub use dispatcher::EventProcessor;
pub use interceptor::{
    DispatchChain, DispatchInterceptor, EventPreparer, InterceptPoint, ListenerChain,
    ListenerInterceptor,
};
pub use listener::{BoxFuture, EventListener, FnListener, ListenerBuilder};
pub use registry::{ListenerRegistry, ListenerSnapshot, RegisteredListener};
