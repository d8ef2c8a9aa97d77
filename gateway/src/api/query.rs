use tracing::{debug, error, info, warn};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use super::{envelope_reply, remote_rejection};
use crate::backend::{BackendClient, BackendOutcome, Operation};
use crate::metrics::Metrics;
use crate::models::{Failure, QueryRequest, ResponseEnvelope};

pub const QUERY_REQUIRED: &str = "Query is required";
pub const SERVICE_UNAVAILABLE: &str = "Medical RAG service is unavailable";
pub const SERVICE_UNAVAILABLE_HINT: &str = "Please ensure the Python medical service is running";
pub const REMOTE_ERROR_FALLBACK: &str = "Medical RAG service error";
pub const QUERY_FAILED: &str = "Failed to process medical query";

pub async fn handle_query(
    request: QueryRequest,
    backend: BackendClient,
    metrics: Metrics,
) -> Result<impl Reply, Rejection> {
    let (status, envelope) = process_query(request, &backend, &metrics).await;
    Ok(envelope_reply(status, &envelope))
}

pub async fn process_query(
    request: QueryRequest,
    backend: &BackendClient,
    metrics: &Metrics,
) -> (StatusCode, ResponseEnvelope) {
    let request_id = Uuid::new_v4();

    let Some(forwarded) = request.into_forwarded() else {
        debug!("Rejecting query [{}]: no query text", request_id);
        metrics.record_rejected_query();
        return (StatusCode::BAD_REQUEST, Failure::new(QUERY_REQUIRED).into());
    };

    info!(
        "Processing query [{}] (k={}, use_hyde={})",
        request_id, forwarded.k, forwarded.use_hyde
    );
    debug!("Query [{}] text: {}", request_id, forwarded.query);

    let outcome = backend.send(Operation::Query, Some(forwarded.to_body())).await;

    match &outcome {
        BackendOutcome::Ok(_) => info!("Query [{}] answered", request_id),
        BackendOutcome::Unreachable(detail) => {
            error!("Query [{}]: medical RAG service unreachable: {}", request_id, detail)
        }
        BackendOutcome::RemoteError { status, .. } => {
            warn!("Query [{}]: medical RAG service returned {}", request_id, status)
        }
        BackendOutcome::TransportError(detail) => error!("Query [{}] failed: {}", request_id, detail),
    }

    map_query_outcome(outcome)
}

/// Total mapping from a backend outcome to what the caller sees.
pub fn map_query_outcome(outcome: BackendOutcome) -> (StatusCode, ResponseEnvelope) {
    match outcome {
        BackendOutcome::Ok(payload) => (StatusCode::OK, ResponseEnvelope::Payload(payload)),
        BackendOutcome::Unreachable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Failure::new(SERVICE_UNAVAILABLE)
                .with_message(SERVICE_UNAVAILABLE_HINT)
                .into(),
        ),
        BackendOutcome::RemoteError { status, body } => remote_rejection(status, body, REMOTE_ERROR_FALLBACK),
        BackendOutcome::TransportError(detail) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Failure::new(QUERY_FAILED).with_message(detail).into(),
        ),
    }
}
