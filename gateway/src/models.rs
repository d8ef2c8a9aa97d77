use chrono::{DateTime, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_K: u32 = 3;
pub const DEFAULT_USE_HYDE: bool = true;

// API Request/Response models
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub k: Option<u32>,
    #[serde(default, rename = "useHyde", alias = "use_hyde")]
    pub use_hyde: Option<bool>,
}

impl QueryRequest {
    /// Apply defaults; `None` when there is no usable query text.
    pub fn into_forwarded(self) -> Option<ForwardedQuery> {
        let query = self.query.filter(|q| !q.trim().is_empty())?;
        Some(ForwardedQuery {
            query,
            k: self.k.unwrap_or(DEFAULT_K),
            use_hyde: self.use_hyde.unwrap_or(DEFAULT_USE_HYDE),
        })
    }
}

/// Body sent to the medical RAG service, in the field names it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedQuery {
    pub query: String,
    pub k: u32,
    pub use_hyde: bool,
}

impl ForwardedQuery {
    pub fn to_body(&self) -> Value {
        json!({
            "query": self.query,
            "k": self.k,
            "use_hyde": self.use_hyde,
        })
    }
}

/// Client-facing result of a forwarded call. A payload is passed through
/// exactly as the service produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Payload(Value),
    Failure(Failure),
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseEnvelope::Payload(payload) => payload.serialize(serializer),
            ResponseEnvelope::Failure(failure) => failure.serialize(serializer),
        }
    }
}

impl From<Failure> for ResponseEnvelope {
    fn from(failure: Failure) -> Self {
        ResponseEnvelope::Failure(failure)
    }
}

/// Failure branch of every response; always serializes `success: false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error: String,
    pub message: Option<String>,
    pub details: Option<Value>,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.message.is_some()) + usize::from(self.details.is_some());
        let mut state = serializer.serialize_struct("Failure", len)?;
        state.serialize_field("success", &false)?;
        state.serialize_field("error", &self.error)?;
        if let Some(message) = &self.message {
            state.serialize_field("message", message)?;
        }
        if let Some(details) = &self.details {
            state.serialize_field("details", details)?;
        }
        state.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    success: bool,
    pub service_status: Value,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn up(service_status: Value) -> Self {
        Self {
            success: true,
            service_status,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HealthReport {
    Up(HealthStatus),
    Down(Failure),
}

#[derive(Debug, Serialize)]
pub struct GatewayHealth {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub services: Value,
}
