use chrono::Utc;
use serde_json::json;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::backend::{BackendClient, BackendOutcome, Operation};
use crate::models::{Failure, GatewayHealth, HealthReport, HealthStatus};

pub const HEALTH_UNAVAILABLE: &str = "Medical RAG service unavailable";

pub async fn handle_health(backend: BackendClient) -> Result<impl Reply, Rejection> {
    let (status, report) = check_health(&backend).await;
    Ok(warp::reply::with_status(warp::reply::json(&report), status))
}

/// Probe the service. Health is advisory, so every failure collapses into one
/// unavailable answer.
pub async fn check_health(backend: &BackendClient) -> (StatusCode, HealthReport) {
    let detail = match backend.send(Operation::Health, None).await {
        BackendOutcome::Ok(service_status) => {
            return (StatusCode::OK, HealthReport::Up(HealthStatus::up(service_status)));
        }
        BackendOutcome::Unreachable(detail) | BackendOutcome::TransportError(detail) => detail,
        BackendOutcome::RemoteError { status, .. } => {
            format!("Medical RAG service health check returned status {}", status)
        }
    };

    warn!("Health check failed: {}", detail);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        HealthReport::Down(Failure::new(HEALTH_UNAVAILABLE).with_message(detail)),
    )
}

/// Liveness of the gateway itself; does not touch the service.
pub async fn handle_gateway_health() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&GatewayHealth {
        status: "healthy",
        timestamp: Utc::now(),
        services: json!({"medical_rag": "external_service"}),
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::testing::{client_with, RecordingTransport};

    #[tokio::test]
    async fn healthy_service_status_is_wrapped() {
        let transport = RecordingTransport::new(BackendOutcome::Ok(json!({"status": "healthy", "initialized": false})));
        let backend = client_with(transport.clone());

        let (status, report) = check_health(&backend).await;

        assert_eq!(status, StatusCode::OK);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["serviceStatus"], json!({"status": "healthy", "initialized": false}));
        assert!(value["timestamp"].is_string());

        let calls = transport.calls();
        assert_eq!(calls[0].0, Operation::Health);
        assert_eq!(calls[0].2, std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn every_failure_is_reported_the_same_way() {
        let outcomes = [
            BackendOutcome::Unreachable("connection refused".into()),
            BackendOutcome::TransportError("timeout of 5000ms exceeded".into()),
            BackendOutcome::RemoteError {
                status: 500,
                body: json!({"error": "boom"}),
            },
        ];

        for outcome in outcomes {
            let backend = client_with(RecordingTransport::new(outcome));
            let (status, report) = check_health(&backend).await;

            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            let value = serde_json::to_value(&report).unwrap();
            assert_eq!(value["success"], false);
            assert_eq!(value["error"], HEALTH_UNAVAILABLE);
            assert!(value.get("serviceStatus").is_none());
        }
    }
}
