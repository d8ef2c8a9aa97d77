use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, warn};

use super::{BackendOutcome, Operation, Transport};

/// Transport that calls the medical RAG service over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        // The service is a sibling process; never route it through a proxy.
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, operation: Operation, body: Option<Value>, timeout: Duration) -> BackendOutcome {
        let url = self.url(operation);

        let mut request = self.client.request(operation.method(), &url).timeout(timeout);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_send_error(&url, timeout, e),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if e.is_timeout() => {
                return BackendOutcome::TransportError(format!(
                    "timeout of {}ms exceeded while reading response from {}",
                    timeout.as_millis(),
                    url
                ));
            }
            Err(e) => {
                return BackendOutcome::TransportError(format!("Failed to read response from {}: {}", url, e));
            }
        };

        if !status.is_success() {
            warn!("Medical RAG service returned {} for {}", status, url);
            return BackendOutcome::RemoteError {
                status: status.as_u16(),
                body: lenient_body(&text),
            };
        }

        match serde_json::from_str(&text) {
            Ok(payload) => BackendOutcome::Ok(payload),
            Err(e) => {
                error!("Invalid JSON from {}: {}", url, e);
                BackendOutcome::TransportError(format!("Invalid JSON in response from {}: {}", url, e))
            }
        }
    }
}

fn classify_send_error(url: &str, timeout: Duration, e: reqwest::Error) -> BackendOutcome {
    // A connect timeout reports both flags; it is a timeout, not a refusal.
    if e.is_timeout() {
        BackendOutcome::TransportError(format!("timeout of {}ms exceeded calling {}", timeout.as_millis(), url))
    } else if e.is_connect() {
        BackendOutcome::Unreachable(format!("Failed to connect to {}: {}", url, e))
    } else {
        BackendOutcome::TransportError(format!("Request to {} failed: {}", url, e))
    }
}

/// Error bodies are opaque: JSON when it parses, the raw text otherwise.
fn lenient_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let transport = HttpTransport::new("http://localhost:5001/").unwrap();
        assert_eq!(transport.base_url(), "http://localhost:5001");
        assert_eq!(transport.url(Operation::Query), "http://localhost:5001/api/medical/query");
        assert_eq!(transport.url(Operation::Health), "http://localhost:5001/health");
    }

    #[test]
    fn lenient_body_keeps_whatever_the_service_sent() {
        assert_eq!(lenient_body(""), Value::Null);
        assert_eq!(lenient_body("  \n"), Value::Null);
        assert_eq!(lenient_body(r#"{"error":"boom"}"#), json!({"error": "boom"}));
        assert_eq!(
            lenient_body("<html>Bad Gateway</html>"),
            Value::String("<html>Bad Gateway</html>".to_string())
        );
    }
}
