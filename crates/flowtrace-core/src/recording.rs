//! In-memory recording backend.
//!
//! Records every span the bridge creates (name, parentage, tags, error
//! events, timestamps, and a finish-call counter) so tests can assert on
//! exactly-once creation and teardown without a real exporter. Shipped as
//! product code: downstream flow engines use it to test their own bridge
//! wiring.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::TraceBackend;

/// Error event logged on a recorded span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Human-readable failure message.
    pub message: String,
    /// Rendering of the failure object, when one was available.
    pub detail: Option<String>,
}

#[derive(Debug)]
struct SpanState {
    id: u64,
    name: String,
    parent_id: Option<u64>,
    started_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    tags: Mutex<BTreeMap<String, String>>,
    error_events: Mutex<Vec<ErrorEvent>>,
    finish_count: AtomicUsize,
}

/// Cheap-clone handle to one recorded span.
#[derive(Debug, Clone)]
pub struct RecordedSpan {
    state: Arc<SpanState>,
}

impl RecordedSpan {
    /// Creation-ordered identifier, unique within one backend.
    pub fn id(&self) -> u64 {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Id of the parent span, `None` for root spans.
    pub fn parent_id(&self) -> Option<u64> {
        self.state.parent_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.state.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *self.state.finished_at.lock().unwrap()
    }

    /// Value of a single tag.
    pub fn tag(&self, key: &str) -> Option<String> {
        self.state.tags.lock().unwrap().get(key).cloned()
    }

    /// Snapshot of all tags.
    pub fn tags(&self) -> BTreeMap<String, String> {
        self.state.tags.lock().unwrap().clone()
    }

    /// Snapshot of all error events logged on this span.
    pub fn error_events(&self) -> Vec<ErrorEvent> {
        self.state.error_events.lock().unwrap().clone()
    }

    /// How many times the bridge finished this span. Must never exceed 1.
    pub fn finish_count(&self) -> usize {
        self.state.finish_count.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.finish_count() > 0
    }
}

/// [`TraceBackend`] that keeps every span in memory for inspection.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    spans: Mutex<Vec<RecordedSpan>>,
    next_id: AtomicU64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every span started so far, in creation order.
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.spans.lock().unwrap().clone()
    }

    /// First span with the given name, if any.
    pub fn span_named(&self, name: &str) -> Option<RecordedSpan> {
        self.spans().into_iter().find(|s| s.name() == name)
    }

    /// Every span with the given name.
    pub fn spans_named(&self, name: &str) -> Vec<RecordedSpan> {
        self.spans()
            .into_iter()
            .filter(|s| s.name() == name)
            .collect()
    }

    /// Spans started without a parent.
    pub fn root_spans(&self) -> Vec<RecordedSpan> {
        self.spans()
            .into_iter()
            .filter(|s| s.parent_id().is_none())
            .collect()
    }

    /// Total spans started.
    pub fn started_count(&self) -> usize {
        self.spans.lock().unwrap().len()
    }

    /// Largest finish-call count over all spans; 1 in any correct run.
    pub fn max_finish_count(&self) -> usize {
        self.spans().iter().map(|s| s.finish_count()).max().unwrap_or(0)
    }
}

impl TraceBackend for RecordingBackend {
    type Span = RecordedSpan;

    fn start_span(&self, name: &str, parent: Option<&Self::Span>) -> Self::Span {
        let span = RecordedSpan {
            state: Arc::new(SpanState {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                name: name.to_string(),
                parent_id: parent.map(|p| p.id()),
                started_at: Utc::now(),
                finished_at: Mutex::new(None),
                tags: Mutex::new(BTreeMap::new()),
                error_events: Mutex::new(Vec::new()),
                finish_count: AtomicUsize::new(0),
            }),
        };
        self.spans.lock().unwrap().push(span.clone());
        span
    }

    fn set_tag(&self, span: &Self::Span, key: &str, value: &str) {
        span.state
            .tags
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn record_error(&self, span: &Self::Span, message: &str, detail: Option<&str>) {
        span.state.error_events.lock().unwrap().push(ErrorEvent {
            message: message.to_string(),
            detail: detail.map(str::to_string),
        });
    }

    fn finish_span(&self, span: &Self::Span) {
        span.state.finish_count.fetch_add(1, Ordering::SeqCst);
        let mut finished = span.state.finished_at.lock().unwrap();
        if finished.is_none() {
            *finished = Some(Utc::now());
        }
    }
}
