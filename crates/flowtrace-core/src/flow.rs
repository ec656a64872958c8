//! Flow identity and per-resumption execution metadata.
//!
//! A flow is a long-lived, suspendable unit of application logic owned by an
//! external scheduler. Flows are identified by an opaque token minted by that
//! scheduler; the bridge only ever uses it as a map key and a tag value.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, globally unique identifier for a flow.
///
/// Produced by the flow engine and stable for the flow's lifetime. The
/// bridge never generates one; every identifier observed here originated
/// from a [`FlowResolver`](crate::resolver::FlowResolver) lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(String);

impl FlowId {
    /// View the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FlowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FlowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<Uuid> for FlowId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

/// Execution metadata for the flow currently resumed on a thread.
///
/// Everything in here is used purely for tagging spans: the flow identity,
/// a human-readable description of the flow's logic (becomes the flow-level
/// span name), and the fiber/thread identifiers of the current resumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowContext {
    /// Identity of the resumed flow.
    pub flow_id: FlowId,
    /// Human-readable description of the flow's logic.
    pub description: String,
    /// Identifier of the fiber/strand executing the flow.
    pub fiber_id: String,
    /// Identifier of the physical thread the flow is resumed on.
    pub thread_id: String,
}

impl FlowContext {
    /// Create a context for a resumption on the calling thread.
    ///
    /// The thread identifier is captured from the current thread; use
    /// [`with_thread_id`](Self::with_thread_id) to override it when the
    /// scheduler tracks threads itself.
    pub fn new(
        flow_id: impl Into<FlowId>,
        description: impl Into<String>,
        fiber_id: impl Into<String>,
    ) -> Self {
        Self {
            flow_id: flow_id.into(),
            description: description.into(),
            fiber_id: fiber_id.into(),
            thread_id: current_thread_label(),
        }
    }

    /// Override the thread identifier.
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }
}

/// Label for the calling thread: its name when set, otherwise its id.
pub fn current_thread_label() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = FlowId::from(uuid);
        assert_eq!(id.as_str(), uuid.to_string());
    }

    #[test]
    fn test_flow_id_equality_and_display() {
        let a = FlowId::from("flow-1");
        let b = FlowId::from("flow-1".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "flow-1");
    }

    #[test]
    fn test_flow_context_captures_thread() {
        let ctx = FlowContext::new("flow-1", "transfer assets", "fiber-7");
        assert_eq!(ctx.flow_id.as_str(), "flow-1");
        assert_eq!(ctx.description, "transfer assets");
        assert_eq!(ctx.fiber_id, "fiber-7");
        assert!(!ctx.thread_id.is_empty());
    }

    #[test]
    fn test_flow_context_thread_override() {
        let ctx = FlowContext::new("flow-1", "transfer assets", "fiber-7")
            .with_thread_id("worker-3");
        assert_eq!(ctx.thread_id, "worker-3");
    }

    #[test]
    fn test_flow_id_serde_transparent() {
        let id = FlowId::from("flow-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"flow-9\"");
        let back: FlowId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
