//! Flow-aware tracing bridge.
//!
//! Correlates backend trace spans with *flows*: long-lived, suspendable
//! units of application logic that an external scheduler may resume on a
//! different worker thread after every suspension. The bridge always finds
//! the span belonging to the flow resumed on the calling thread, with no
//! handle threading through application code, and maintains the span
//! hierarchy root → per-flow → per-operation, created lazily exactly once
//! per identity and torn down when the flow ends.
//!
//! # Architecture
//!
//! - [`FlowResolver`] - injected capability answering "which flow is
//!   resumed on this thread right now"; [`ThreadFlowResolver`] +
//!   [`ResumedFlow`] is the stock thread-local implementation.
//! - [`SpanRegistry`] - concurrent flow-id → span map with atomic
//!   exactly-once creation per identity.
//! - [`FlowTracer`] - the bridge: owns the registry and the backend handle,
//!   exposes the tracing operations.
//! - [`TraceBackend`] - the backend seam; [`RecordingBackend`] is the
//!   in-memory implementation for tests, the `flowtrace-otel` crate adapts
//!   OpenTelemetry.
//!
//! # Example
//!
//! ```
//! use flowtrace_core::{
//!     FlowContext, FlowTracer, RecordingBackend, ResumedFlow, ThreadFlowResolver,
//! };
//! use std::sync::Arc;
//!
//! let tracer = FlowTracer::new(RecordingBackend::new(), Arc::new(ThreadFlowResolver::new()));
//!
//! // The scheduler marks the flow as resumed on this thread...
//! let resumed = ResumedFlow::enter(FlowContext::new("flow-1", "transfer assets", "fiber-7"));
//!
//! // ...and traced operations correlate automatically.
//! let result: Result<u64, std::io::Error> = tracer.scoped("verify signatures", |span| {
//!     if let Some(span) = span {
//!         span.set_tag("signatures", "3");
//!     }
//!     Ok(3)
//! });
//! assert_eq!(result.unwrap(), 3);
//!
//! tracer.end_flow();
//! drop(resumed);
//! tracer.terminate();
//!
//! let backend = tracer.backend();
//! assert!(backend.span_named("transfer assets").unwrap().is_finished());
//! assert_eq!(backend.max_finish_count(), 1);
//! ```

pub mod backend;
pub mod bridge;
pub mod config;
pub mod flow;
pub mod recording;
pub mod registry;
pub mod resolver;

pub use backend::TraceBackend;
pub use bridge::{FlowTracer, SpanGuard};
pub use config::{TracerConfig, TracerConfigBuilder};
pub use flow::{FlowContext, FlowId};
pub use recording::{ErrorEvent, RecordedSpan, RecordingBackend};
pub use registry::SpanRegistry;
pub use resolver::{FlowResolver, ResumedFlow, ThreadFlowResolver};
