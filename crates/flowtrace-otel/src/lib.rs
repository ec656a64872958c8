//! OpenTelemetry backend for the flowtrace bridge.
//!
//! Adapts the [`TraceBackend`] seam onto the OpenTelemetry SDK: spans are
//! carried as otel [`Context`]s, tags become attributes, error events become
//! span events with error status, and the provider is built from a
//! [`TracerConfig`] passed through verbatim (sampler ratio, service name,
//! flush interval).
//!
//! The wire exporter is injected: construct whichever
//! [`opentelemetry_sdk::trace::SpanExporter`] matches your collector from
//! [`TracerConfig::endpoint`] and hand it to [`OtelBackend::install`].
//!
//! # Example
//!
//! ```no_run
//! use flowtrace_core::{FlowTracer, ThreadFlowResolver, TracerConfig};
//! use flowtrace_otel::OtelBackend;
//! use opentelemetry_sdk::trace::InMemorySpanExporter;
//! use std::sync::Arc;
//!
//! let config = TracerConfig::from_env();
//! let backend = OtelBackend::install(&config, InMemorySpanExporter::default()).unwrap();
//! let tracer = FlowTracer::new(backend, Arc::new(ThreadFlowResolver::new()));
//!
//! // ... trace flows ...
//!
//! tracer.terminate();
//! tracer.backend().shutdown().unwrap();
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::{TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_sdk::trace::{
    BatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracerProvider, SpanExporter,
};
use opentelemetry_sdk::Resource;
use thiserror::Error;

use flowtrace_core::{TraceBackend, TracerConfig};

/// Errors from building or tearing down the OpenTelemetry backend.
#[derive(Error, Debug)]
pub enum OtelError {
    #[error("sample ratio must be within [0.0, 1.0], got {0}")]
    InvalidSampleRatio(f64),

    #[error("failed to flush spans: {0}")]
    Flush(String),

    #[error("failed to shut down tracer provider: {0}")]
    Shutdown(String),
}

pub type Result<T> = std::result::Result<T, OtelError>;

type SdkTracer = <SdkTracerProvider as opentelemetry::trace::TracerProvider>::Tracer;

/// Span handle: an otel context carrying the live span.
#[derive(Debug, Clone)]
pub struct OtelSpan {
    cx: Context,
    name: Arc<str>,
}

impl OtelSpan {
    /// The otel context carrying this span, usable for manual propagation.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// [`TraceBackend`] over an OpenTelemetry tracer provider.
pub struct OtelBackend {
    tracer: SdkTracer,
    provider: SdkTracerProvider,
    log_spans: bool,
}

impl OtelBackend {
    /// Build a tracer provider from `config`, register it as the global
    /// provider, and return a backend driving it.
    ///
    /// Sampling is passthrough: ratio `1.0` samples everything, anything
    /// lower becomes a parent-based fixed-ratio sampler. The flush interval
    /// configures the batch processor's scheduled delay.
    pub fn install(config: &TracerConfig, exporter: impl SpanExporter + 'static) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.sample_ratio) {
            return Err(OtelError::InvalidSampleRatio(config.sample_ratio));
        }
        let sampler = if config.sample_ratio >= 1.0 {
            Sampler::AlwaysOn
        } else {
            Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(config.sample_ratio)))
        };

        let processor = BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                BatchConfigBuilder::default()
                    .with_scheduled_delay(Duration::from_millis(config.flush_interval_ms))
                    .build(),
            )
            .build();

        let provider = SdkTracerProvider::builder()
            .with_sampler(sampler)
            .with_resource(
                Resource::builder()
                    .with_service_name(config.service_name.clone())
                    .build(),
            )
            .with_span_processor(processor)
            .build();

        global::set_tracer_provider(provider.clone());
        let tracer = provider.tracer(config.service_name.clone());

        tracing::debug!(
            service_name = %config.service_name,
            endpoint = %config.endpoint,
            sample_ratio = config.sample_ratio,
            "installed tracer provider"
        );

        Ok(Self {
            tracer,
            provider,
            log_spans: config.log_spans,
        })
    }

    /// Export all batched spans now.
    pub fn force_flush(&self) -> Result<()> {
        self.provider
            .force_flush()
            .map_err(|e| OtelError::Flush(e.to_string()))
    }

    /// Flush and shut down the provider. Call after
    /// [`FlowTracer::terminate`](flowtrace_core::FlowTracer::terminate) at
    /// process exit.
    pub fn shutdown(&self) -> Result<()> {
        self.provider
            .shutdown()
            .map_err(|e| OtelError::Shutdown(e.to_string()))
    }
}

impl fmt::Debug for OtelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelBackend")
            .field("log_spans", &self.log_spans)
            .finish_non_exhaustive()
    }
}

impl TraceBackend for OtelBackend {
    type Span = OtelSpan;

    fn start_span(&self, name: &str, parent: Option<&Self::Span>) -> Self::Span {
        let base = match parent {
            Some(p) => p.cx.clone(),
            // fresh context so a root span never inherits ambient parentage
            None => Context::new(),
        };
        let span = self.tracer.start_with_context(name.to_string(), &base);
        OtelSpan {
            cx: base.with_span(span),
            name: Arc::from(name),
        }
    }

    fn set_tag(&self, span: &Self::Span, key: &str, value: &str) {
        span.cx
            .span()
            .set_attribute(KeyValue::new(key.to_string(), value.to_string()));
    }

    fn record_error(&self, span: &Self::Span, message: &str, detail: Option<&str>) {
        let span_ref = span.cx.span();
        span_ref.set_status(opentelemetry::trace::Status::error(message.to_string()));
        let mut fields = vec![KeyValue::new("message", message.to_string())];
        if let Some(detail) = detail {
            fields.push(KeyValue::new("error.object", detail.to_string()));
        }
        span_ref.add_event("error", fields);
    }

    fn finish_span(&self, span: &Self::Span) {
        span.cx.span().end();
        if self.log_spans {
            tracing::debug!(name = %span.name, "finished span");
        }
    }
}
