//! Prometheus metrics for the gateway.
//!
//! The registry is owned by [`Metrics`] and handed to the filters, so every
//! test can build its own without clashing on registration.

use std::time::Duration;

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::backend::{BackendOutcome, Operation};
use crate::error::ApiError;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    backend_calls: IntCounterVec,
    backend_call_duration: HistogramVec,
    rejected_queries: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let backend_calls = IntCounterVec::new(
            Opts::new("gateway_backend_calls_total", "Calls to the medical RAG service by outcome"),
            &["operation", "outcome"],
        )?;

        let backend_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "gateway_backend_call_duration_seconds",
                "Medical RAG service call duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["operation"],
        )?;

        let rejected_queries = IntCounter::new(
            "gateway_rejected_queries_total",
            "Queries rejected before reaching the medical RAG service",
        )?;

        registry.register(Box::new(backend_calls.clone()))?;
        registry.register(Box::new(backend_call_duration.clone()))?;
        registry.register(Box::new(rejected_queries.clone()))?;

        Ok(Self {
            registry,
            backend_calls,
            backend_call_duration,
            rejected_queries,
        })
    }

    pub fn record_backend_call(&self, operation: Operation, outcome: &BackendOutcome, elapsed: Duration) {
        self.backend_calls
            .with_label_values(&[operation.label(), outcome.label()])
            .inc();
        self.backend_call_duration
            .with_label_values(&[operation.label()])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_rejected_query(&self) {
        self.rejected_queries.inc();
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, ApiError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_queries_are_counted() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected_query();
        metrics.record_rejected_query();

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("gateway_rejected_queries_total 2"));
    }

    #[test]
    fn backend_calls_are_labelled_by_operation_and_outcome() {
        let metrics = Metrics::new().unwrap();
        metrics.record_backend_call(
            Operation::Query,
            &BackendOutcome::Unreachable("refused".to_string()),
            Duration::from_millis(3),
        );

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains(r#"gateway_backend_calls_total{operation="query",outcome="unreachable"} 1"#));
        assert!(rendered.contains(r#"gateway_backend_call_duration_seconds_count{operation="query"} 1"#));
    }
}
