//! Shared helpers for the cross-thread bridge tests.
//!
//! The tests simulate a scheduler by resuming flows on plain OS threads:
//! [`resume`] plays one resumption (enter the thread-local guard, run the
//! continuation, drop the guard), so a flow can hop between threads the way
//! a real fiber scheduler moves suspended work.

use flowtrace_core::{FlowContext, ResumedFlow};
use uuid::Uuid;

/// Initialize test logging once; safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Context for a freshly minted flow identity.
pub fn unique_flow(description: &str) -> FlowContext {
    FlowContext::new(Uuid::new_v4(), description, Uuid::new_v4().to_string())
}

/// Run one resumption of `ctx` on the calling thread.
pub fn resume<T>(ctx: &FlowContext, continuation: impl FnOnce() -> T) -> T {
    let _resumed = ResumedFlow::enter(ctx.clone());
    continuation()
}

/// Run one resumption of `ctx` on a dedicated thread and join it.
pub fn resume_on_new_thread<T: Send + 'static>(
    ctx: &FlowContext,
    continuation: impl FnOnce() -> T + Send + 'static,
) -> T {
    let ctx = ctx.clone();
    std::thread::spawn(move || {
        let _resumed = ResumedFlow::enter(ctx);
        continuation()
    })
    .join()
    .expect("resumed thread panicked")
}
