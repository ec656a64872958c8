//! The tracing bridge.
//!
//! [`FlowTracer`] correlates backend spans with flows resumed on arbitrary
//! worker threads. Every public operation starts by asking the injected
//! [`FlowResolver`] which flow (if any) is resumed on the calling thread;
//! without one the operation degrades to a no-op (or a direct passthrough
//! for [`scoped`](FlowTracer::scoped)): tracing is best-effort
//! observability, never a correctness dependency of the traced logic.
//!
//! Span hierarchy:
//!
//! ```text
//! execution (root, one per process)
//!   └─ <flow description> (one per flow)
//!       └─ <operation name> (one per scoped operation)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::backend::TraceBackend;
use crate::flow::{FlowContext, FlowId};
use crate::registry::SpanRegistry;
use crate::resolver::FlowResolver;

/// Name of the process-wide root span.
const ROOT_SPAN_NAME: &str = "execution";

const TAG_FLOW_ID: &str = "flow-id";
const TAG_FIBER_ID: &str = "fiber-id";
const TAG_THREAD_ID: &str = "thread-id";
const TAG_ERROR: &str = "error";

/// Bridge between a flow scheduler and a tracing backend.
///
/// Shared across worker threads behind an `Arc`; all operations are safe
/// under parallel invocation, including racing first-creation of the root
/// span and of per-flow spans.
#[derive(Debug)]
pub struct FlowTracer<B: TraceBackend> {
    backend: B,
    resolver: Arc<dyn FlowResolver>,
    registry: SpanRegistry<B::Span>,
    root: OnceLock<B::Span>,
    root_finished: AtomicBool,
}

impl<B: TraceBackend> FlowTracer<B> {
    /// Create a bridge over `backend`, resolving flows through `resolver`.
    pub fn new(backend: B, resolver: Arc<dyn FlowResolver>) -> Self {
        Self {
            backend,
            resolver,
            registry: SpanRegistry::new(),
            root: OnceLock::new(),
            root_finished: AtomicBool::new(false),
        }
    }

    /// The backend this bridge drives.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of flows with a live flow-level span.
    pub fn active_flows(&self) -> usize {
        self.registry.len()
    }

    /// Whether `id` currently has a live flow-level span.
    pub fn is_tracking(&self, id: &FlowId) -> bool {
        self.registry.contains(id)
    }

    /// Root span, created on first use.
    fn root_span(&self) -> &B::Span {
        self.root.get_or_init(|| {
            tracing::debug!(name = ROOT_SPAN_NAME, "starting root span");
            self.backend.start_span(ROOT_SPAN_NAME, None)
        })
    }

    fn decorate(&self, span: &B::Span, ctx: &FlowContext) {
        self.backend.set_tag(span, TAG_FLOW_ID, ctx.flow_id.as_str());
        self.backend.set_tag(span, TAG_FIBER_ID, &ctx.fiber_id);
        self.backend.set_tag(span, TAG_THREAD_ID, &ctx.thread_id);
    }

    /// Flow-level span for `ctx`, created under the root span on first use.
    fn flow_span_for(&self, ctx: &FlowContext) -> B::Span {
        self.registry.get_or_create(&ctx.flow_id, || {
            let root = self.root_span();
            let span = self.backend.start_span(&ctx.description, Some(root));
            self.decorate(&span, ctx);
            tracing::debug!(flow_id = %ctx.flow_id, "started flow span");
            span
        })
    }

    /// Span of the flow resumed on the calling thread, creating it (and the
    /// root span) on first use. `None` when no flow is resumed.
    pub fn flow_span(&self) -> Option<B::Span> {
        let ctx = self.resolver.current_flow()?;
        Some(self.flow_span_for(&ctx))
    }

    /// Run `action` inside a named child span of the current flow.
    ///
    /// Without a resumed flow, `action` runs with `None` and its result is
    /// returned unchanged; no span is created. With one, a child span of the
    /// flow-level span is started, tagged with the flow/fiber/thread
    /// identity, and finished exactly once on every exit path (normal
    /// return, error return, or panic). An `Err` is additionally tagged as an
    /// error and logged on the span before being returned unchanged; the
    /// bridge never swallows or alters the failure.
    pub fn scoped<T, E, F>(&self, name: &str, action: F) -> Result<T, E>
    where
        F: FnOnce(Option<&SpanGuard<'_, B>>) -> Result<T, E>,
        E: fmt::Display + fmt::Debug,
    {
        let Some(ctx) = self.resolver.current_flow() else {
            return action(None);
        };
        let guard = self.start_named(name, &ctx);
        let result = action(Some(&guard));
        if let Err(error) = &result {
            guard.set_tag(TAG_ERROR, "true");
            guard.record_error(&error.to_string(), Some(&format!("{error:?}")));
        }
        result
    }

    /// Start a named child span of the current flow, finished when the
    /// returned guard drops. `None` when no flow is resumed.
    ///
    /// Prefer [`scoped`](Self::scoped) for bounded operations; this is the
    /// escape hatch for call sites whose span must outlive a closure.
    pub fn named_span(&self, name: &str) -> Option<SpanGuard<'_, B>> {
        let ctx = self.resolver.current_flow()?;
        Some(self.start_named(name, &ctx))
    }

    fn start_named(&self, name: &str, ctx: &FlowContext) -> SpanGuard<'_, B> {
        let parent = self.flow_span_for(ctx);
        let span = self.backend.start_span(name, Some(&parent));
        self.decorate(&span, ctx);
        SpanGuard {
            backend: &self.backend,
            span,
        }
    }

    /// End the current flow's trace: remove its registry entry and finish
    /// its flow-level span.
    ///
    /// No-op when no flow is resumed or the flow never traced anything;
    /// calling it twice is safe (the second call finds no entry).
    pub fn end_flow(&self) {
        let Some(ctx) = self.resolver.current_flow() else {
            return;
        };
        if let Some(span) = self.registry.remove(&ctx.flow_id) {
            self.backend.finish_span(&span);
            tracing::debug!(flow_id = %ctx.flow_id, "finished flow span");
        }
    }

    /// Finish the root span if it was ever created. Intended for process
    /// shutdown; at most once, further calls are no-ops.
    ///
    /// Flows not yet ended are not flushed here; ending them is the
    /// caller's lifecycle discipline.
    pub fn terminate(&self) {
        if let Some(root) = self.root.get() {
            if !self.root_finished.swap(true, Ordering::SeqCst) {
                self.backend.finish_span(root);
                tracing::debug!("finished root span");
            }
        }
    }
}

/// Live named child span, finished exactly once when dropped.
///
/// Handed to [`FlowTracer::scoped`] actions (and returned by
/// [`FlowTracer::named_span`]) so call sites can annotate the span while it
/// is open. Dropping the guard is the only way to finish the span, which is
/// what makes the release unconditional across early returns, `?`, and
/// unwinding.
#[must_use = "the span is finished when the guard drops"]
pub struct SpanGuard<'a, B: TraceBackend> {
    backend: &'a B,
    span: B::Span,
}

impl<B: TraceBackend> SpanGuard<'_, B> {
    /// Set a string-valued tag on the span.
    pub fn set_tag(&self, key: &str, value: &str) {
        self.backend.set_tag(&self.span, key, value);
    }

    /// Log an error event on the span.
    pub fn record_error(&self, message: &str, detail: Option<&str>) {
        self.backend.record_error(&self.span, message, detail);
    }

    /// The underlying backend span handle.
    pub fn span(&self) -> &B::Span {
        &self.span
    }
}

impl<B: TraceBackend> Drop for SpanGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.finish_span(&self.span);
    }
}

impl<B: TraceBackend> fmt::Debug for SpanGuard<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanGuard").finish_non_exhaustive()
    }
}
