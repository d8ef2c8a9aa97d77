use serde_json::json;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use super::{envelope_reply, remote_rejection};
use crate::backend::{BackendClient, BackendOutcome, Operation};
use crate::models::{Failure, ResponseEnvelope};

pub const INITIALIZE_FAILED: &str = "Failed to initialize medical RAG service";

pub async fn handle_initialize(backend: BackendClient) -> Result<impl Reply, Rejection> {
    let (status, envelope) = trigger_initialize(&backend).await;
    Ok(envelope_reply(status, &envelope))
}

pub async fn trigger_initialize(backend: &BackendClient) -> (StatusCode, ResponseEnvelope) {
    info!("Requesting medical RAG service initialization");
    let outcome = backend.send(Operation::Initialize, Some(json!({}))).await;
    map_initialize_outcome(outcome)
}

/// Operators trigger this knowing whether the service runs, so an
/// unreachable service is just another failure here.
pub fn map_initialize_outcome(outcome: BackendOutcome) -> (StatusCode, ResponseEnvelope) {
    match outcome {
        BackendOutcome::Ok(payload) => {
            info!("Medical RAG service initialization finished");
            (StatusCode::OK, ResponseEnvelope::Payload(payload))
        }
        BackendOutcome::RemoteError { status, body } => {
            error!("Failed to initialize medical RAG service: status {}", status);
            remote_rejection(status, body, INITIALIZE_FAILED)
        }
        BackendOutcome::Unreachable(detail) | BackendOutcome::TransportError(detail) => {
            error!("Failed to initialize medical RAG service: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Failure::new(INITIALIZE_FAILED).with_message(detail).into(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{client_with, RecordingTransport};

    #[tokio::test]
    async fn sends_empty_body_with_long_timeout() {
        let payload = json!({"message": "Medical RAG Service initialized successfully", "initialized": true});
        let transport = RecordingTransport::new(BackendOutcome::Ok(payload.clone()));
        let backend = client_with(transport.clone());

        let (status, envelope) = trigger_initialize(&backend).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope, ResponseEnvelope::Payload(payload));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Operation::Initialize);
        assert_eq!(calls[0].1, Some(json!({})));
        assert_eq!(calls[0].2, std::time::Duration::from_secs(60));
    }

    #[test]
    fn unreachable_is_a_generic_failure() {
        let (status, envelope) = map_initialize_outcome(BackendOutcome::Unreachable("connection refused".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            envelope,
            ResponseEnvelope::Failure(Failure::new(INITIALIZE_FAILED).with_message("connection refused"))
        );
    }

    #[test]
    fn remote_error_uses_initialize_fallback() {
        let body = json!({"message": "no error field"});
        let (status, envelope) = map_initialize_outcome(BackendOutcome::RemoteError {
            status: 500,
            body: body.clone(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            envelope,
            ResponseEnvelope::Failure(Failure::new(INITIALIZE_FAILED).with_details(body))
        );

        let (status, envelope) = map_initialize_outcome(BackendOutcome::RemoteError {
            status: 500,
            body: json!({"error": "Failed to initialize service: out of memory"}),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        match envelope {
            ResponseEnvelope::Failure(failure) => {
                assert_eq!(failure.error, "Failed to initialize service: out of memory")
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
