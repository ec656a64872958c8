//! Contract for the tracing backend collaborator.
//!
//! The bridge does not export, sample, or store spans itself; it drives an
//! external backend through this seam. Implementations are expected to be
//! non-blocking in steady state (buffered export) and must tolerate calls
//! from any thread.

use std::fmt;

/// Span-producing backend the bridge acts on.
///
/// `Span` is an opaque, cheaply-cloneable handle: the bridge stores clones
/// in its registry and hands references to traced actions, while the
/// backend retains ownership of the underlying interval record.
///
/// Finishing is terminal. The bridge guarantees it never finishes the same
/// span twice; implementations need not defend against it.
pub trait TraceBackend: Send + Sync + fmt::Debug + 'static {
    /// Opaque span handle.
    type Span: Clone + Send + Sync + fmt::Debug + 'static;

    /// Build and start a named span, optionally as a child of `parent`.
    fn start_span(&self, name: &str, parent: Option<&Self::Span>) -> Self::Span;

    /// Set a string-valued tag on a live span.
    fn set_tag(&self, span: &Self::Span, key: &str, value: &str);

    /// Log a structured error event on a live span.
    ///
    /// `message` is the failure's human-readable message; `detail` carries a
    /// rendering of the failure object itself when one is available.
    fn record_error(&self, span: &Self::Span, message: &str, detail: Option<&str>);

    /// Finish a span, closing its interval.
    fn finish_span(&self, span: &Self::Span);
}
