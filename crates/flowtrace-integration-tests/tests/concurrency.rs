//! Races on the shared registry and the root span.

use flowtrace_core::{FlowTracer, RecordingBackend, ResumedFlow, ThreadFlowResolver};
use flowtrace_integration_tests::{init_test_logging, unique_flow};
use std::fmt;
use std::sync::{Arc, Barrier};

fn tracer() -> Arc<FlowTracer<RecordingBackend>> {
    init_test_logging();
    Arc::new(FlowTracer::new(
        RecordingBackend::new(),
        Arc::new(ThreadFlowResolver::new()),
    ))
}

#[derive(Debug)]
struct StepFailed;

impl fmt::Display for StepFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("step failed")
    }
}

#[test]
fn two_flows_on_two_threads_share_one_root() {
    let tracer = tracer();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["flow one logic", "flow two logic"]
        .into_iter()
        .map(|description| {
            let tracer = Arc::clone(&tracer);
            let barrier = Arc::clone(&barrier);
            let ctx = unique_flow(description);
            std::thread::spawn(move || {
                let _resumed = ResumedFlow::enter(ctx);
                barrier.wait();
                let r: Result<(), StepFailed> = tracer.scoped("work", |_| Ok(()));
                r.unwrap();
                tracer.end_flow();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let backend = tracer.backend();
    let roots = backend.root_spans();
    assert_eq!(roots.len(), 1, "both flows must attach to a single root");
    let root_id = roots[0].id();

    let flow_one = backend.span_named("flow one logic").unwrap();
    let flow_two = backend.span_named("flow two logic").unwrap();
    assert_ne!(flow_one.id(), flow_two.id());
    assert_eq!(flow_one.parent_id(), Some(root_id));
    assert_eq!(flow_two.parent_id(), Some(root_id));
    assert_eq!(backend.max_finish_count(), 1);
}

#[test]
fn many_flows_many_resumptions_create_one_span_each() {
    let tracer = tracer();
    let flows = 8;
    let resumptions_per_flow = 16;
    let barrier = Arc::new(Barrier::new(flows * resumptions_per_flow));

    let contexts: Vec<_> = (0..flows)
        .map(|i| unique_flow(&format!("flow {i} logic")))
        .collect();

    let handles: Vec<_> = contexts
        .iter()
        .flat_map(|ctx| {
            (0..resumptions_per_flow).map(|step| {
                let tracer = Arc::clone(&tracer);
                let barrier = Arc::clone(&barrier);
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    let _resumed = ResumedFlow::enter(ctx);
                    barrier.wait();
                    let r: Result<(), StepFailed> =
                        tracer.scoped(&format!("step {step}"), |_| Ok(()));
                    r.unwrap();
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let backend = tracer.backend();
    assert_eq!(backend.root_spans().len(), 1);
    for (i, ctx) in contexts.iter().enumerate() {
        let spans = backend.spans_named(&format!("flow {i} logic"));
        assert_eq!(spans.len(), 1, "flow {i} must have exactly one span");
        assert_eq!(
            spans[0].tag("flow-id").as_deref(),
            Some(ctx.flow_id.as_str())
        );
    }
    // flows + steps + root, no duplicates from racing creation
    assert_eq!(
        backend.started_count(),
        1 + flows + flows * resumptions_per_flow
    );
    assert_eq!(tracer.active_flows(), flows);
    assert_eq!(backend.max_finish_count(), 1);
}

#[test]
fn same_flow_racing_resumptions_share_the_flow_span() {
    let tracer = tracer();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let ctx = unique_flow("contended flow logic");

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let tracer = Arc::clone(&tracer);
            let barrier = Arc::clone(&barrier);
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                let _resumed = ResumedFlow::enter(ctx);
                barrier.wait();
                tracer.flow_span().unwrap().id()
            })
        })
        .collect();

    let ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(
        tracer.backend().spans_named("contended flow logic").len(),
        1
    );
}

#[test]
fn terminate_races_to_a_single_root_finish() {
    let tracer = tracer();
    {
        let _resumed = ResumedFlow::enter(unique_flow("any flow"));
        tracer.flow_span().unwrap();
    }

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let tracer = Arc::clone(&tracer);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                tracer.terminate();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(tracer.backend().span_named("execution").unwrap().finish_count(), 1);
}
