//! Resolution of the flow currently resumed on the calling thread.
//!
//! The scheduler owns the fact "thread T is currently running flow F"; the
//! bridge only queries it. The query is injected as a [`FlowResolver`] so
//! the bridge never reaches into scheduler internals and tests can
//! substitute a stub.
//!
//! [`ThreadFlowResolver`] is the stock implementation for thread-based
//! engines: the scheduler wraps every resumption in a [`ResumedFlow`] guard,
//! which installs the flow into a thread-local slot and restores the
//! previous value when the resumption ends.

use crate::flow::{current_thread_label, FlowContext};
use std::cell::RefCell;
use std::fmt;

/// Query for the flow currently resumed on the calling thread.
///
/// Implementations must be pure queries: no side effects, safe to call from
/// any thread at any time, including when no flow is resumed (`None`).
pub trait FlowResolver: Send + Sync + fmt::Debug {
    /// Returns the execution metadata of the flow resumed on the calling
    /// thread, or `None` if the thread is not running a flow.
    fn current_flow(&self) -> Option<FlowContext>;
}

thread_local! {
    static RESUMED: RefCell<Option<FlowContext>> = const { RefCell::new(None) };
}

/// Thread-local [`FlowResolver`] for thread-based schedulers.
///
/// Pairs with [`ResumedFlow`]: the scheduler enters a guard when it resumes
/// a flow on a worker thread and drops it on suspension. Lookups see
/// whatever guard is innermost on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadFlowResolver;

impl ThreadFlowResolver {
    pub fn new() -> Self {
        Self
    }
}

impl FlowResolver for ThreadFlowResolver {
    fn current_flow(&self) -> Option<FlowContext> {
        RESUMED.with(|slot| slot.borrow().clone())
    }
}

/// RAII marker that a flow is resumed on the current thread.
///
/// Created by the scheduler around each resumption. On drop the previous
/// thread-local value is restored, so nested resumptions (a flow
/// synchronously driving a sub-flow) unwind correctly.
#[must_use = "the flow is only resumed while the guard is alive"]
#[derive(Debug)]
pub struct ResumedFlow {
    previous: Option<FlowContext>,
}

impl ResumedFlow {
    /// Mark `ctx` as the flow resumed on the calling thread.
    ///
    /// The context's thread identifier is refreshed to the calling thread:
    /// the resumption instant is the one moment the physical thread is known.
    pub fn enter(ctx: FlowContext) -> Self {
        let ctx = ctx.with_thread_id(current_thread_label());
        let previous = RESUMED.with(|slot| slot.borrow_mut().replace(ctx));
        Self { previous }
    }
}

impl Drop for ResumedFlow {
    fn drop(&mut self) {
        let previous = self.previous.take();
        RESUMED.with(|slot| *slot.borrow_mut() = previous);
    }
}
