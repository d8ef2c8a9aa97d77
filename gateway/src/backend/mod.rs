// Backend client: the single place that talks to the medical RAG service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::metrics::Metrics;

mod http_client;

pub use http_client::HttpTransport;

/// Remote operations exposed by the medical RAG service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Health,
    Initialize,
}

impl Operation {
    pub fn path(self) -> &'static str {
        match self {
            Operation::Query => "/api/medical/query",
            Operation::Health => "/health",
            Operation::Initialize => "/api/medical/initialize",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Operation::Health => Method::GET,
            Operation::Query | Operation::Initialize => Method::POST,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Health => "health",
            Operation::Initialize => "initialize",
        }
    }
}

/// Everything a single backend call can end in.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// 2xx with a JSON body.
    Ok(Value),
    /// No connection could be established.
    Unreachable(String),
    /// The service answered with a non-success status.
    RemoteError { status: u16, body: Value },
    /// Timeout or any other transport failure.
    TransportError(String),
}

impl BackendOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            BackendOutcome::Ok(_) => "ok",
            BackendOutcome::Unreachable(_) => "unreachable",
            BackendOutcome::RemoteError { .. } => "remote_error",
            BackendOutcome::TransportError(_) => "transport_error",
        }
    }
}

/// Per-operation timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub health: Duration,
    pub query: Duration,
    pub initialize: Duration,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            query: Duration::from_secs(30),
            // Initialization may load models and build indexes from scratch.
            initialize: Duration::from_secs(60),
        }
    }
}

impl BackendTimeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Health => self.health,
            Operation::Query => self.query,
            Operation::Initialize => self.initialize,
        }
    }
}

/// Wire-level transport to the backend. One attempt per call, never retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, operation: Operation, body: Option<Value>, timeout: Duration) -> BackendOutcome;
}

#[derive(Clone)]
pub struct BackendClient {
    transport: Arc<dyn Transport>,
    timeouts: BackendTimeouts,
    metrics: Metrics,
}

impl BackendClient {
    pub fn new(transport: Arc<dyn Transport>, timeouts: BackendTimeouts, metrics: Metrics) -> Self {
        Self {
            transport,
            timeouts,
            metrics,
        }
    }

    pub async fn send(&self, operation: Operation, body: Option<Value>) -> BackendOutcome {
        let timeout = self.timeouts.for_operation(operation);
        let started = Instant::now();

        let outcome = self.transport.send(operation, body, timeout).await;

        let elapsed = started.elapsed();
        debug!(
            "Backend {} finished as {} in {}ms",
            operation.label(),
            outcome.label(),
            elapsed.as_millis()
        );
        self.metrics.record_backend_call(operation, &outcome, elapsed);

        outcome
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Transport that records every call and answers with a fixed outcome.
    pub struct RecordingTransport {
        outcome: BackendOutcome,
        calls: Mutex<Vec<(Operation, Option<Value>, Duration)>>,
    }

    impl RecordingTransport {
        pub fn new(outcome: BackendOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<(Operation, Option<Value>, Duration)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, operation: Operation, body: Option<Value>, timeout: Duration) -> BackendOutcome {
            self.calls.lock().unwrap().push((operation, body, timeout));
            self.outcome.clone()
        }
    }

    pub fn client_with(transport: Arc<RecordingTransport>) -> BackendClient {
        BackendClient::new(transport, BackendTimeouts::default(), Metrics::new().unwrap())
    }
}
