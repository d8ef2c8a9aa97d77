use std::convert::Infallible;

use serde::de::DeserializeOwned;
use serde_json::Value;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::backend::BackendClient;
use crate::error::{handle_rejection, ApiError};
use crate::metrics::Metrics;
use crate::middleware;
use crate::models::{Failure, ResponseEnvelope};

mod health;
mod initialize;
mod query;

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Full gateway surface: routes, rejection handling, CORS and request log.
/// CORS wraps the recovered replies so failure envelopes stay readable
/// cross-origin.
pub fn app(
    backend: BackendClient,
    metrics: Metrics,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    routes(backend, metrics)
        .recover(handle_rejection)
        .with(middleware::cors())
        .with(warp::log("medirag_gateway::api"))
}

pub fn routes(
    backend: BackendClient,
    metrics: Metrics,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let medical = warp::path("api").and(warp::path("medical"));

    let query_route = medical
        .and(warp::path("query"))
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_backend(backend.clone()))
        .and(with_metrics(metrics.clone()))
        .and_then(query::handle_query);

    let health_route = medical
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_backend(backend.clone()))
        .and_then(health::handle_health);

    // Any body on initialize is ignored; the service always gets `{}`.
    let initialize_route = medical
        .and(warp::path("initialize"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_backend(backend))
        .and_then(initialize::handle_initialize);

    let gateway_health_route = warp::path("api")
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health::handle_gateway_health);

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_metrics(metrics))
        .and_then(handle_metrics);

    query_route
        .or(health_route)
        .or(initialize_route)
        .or(gateway_health_route)
        .or(metrics_route)
}

async fn handle_metrics(metrics: Metrics) -> Result<impl Reply, Rejection> {
    let body = metrics.render().map_err(warp::reject::custom::<ApiError>)?;
    Ok(warp::reply::with_header(body, "Content-Type", prometheus::TEXT_FORMAT))
}

/// JSON body with a cap on the declared length. Chunked bodies carry no
/// `Content-Length` and are accepted.
fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::header::optional::<u64>("content-length")
        .and_then(|declared: Option<u64>| async move {
            match declared {
                Some(len) if len > MAX_BODY_BYTES => {
                    Err(warp::reject::custom(ApiError::BodyTooLarge(len, MAX_BODY_BYTES)))
                }
                _ => Ok(()),
            }
        })
        .untuple_one()
        .and(warp::body::json())
}

fn with_backend(
    backend: BackendClient,
) -> impl Filter<Extract = (BackendClient,), Error = Infallible> + Clone {
    warp::any().map(move || backend.clone())
}

fn with_metrics(
    metrics: Metrics,
) -> impl Filter<Extract = (Metrics,), Error = Infallible> + Clone {
    warp::any().map(move || metrics.clone())
}

fn envelope_reply(status: StatusCode, envelope: &ResponseEnvelope) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(envelope), status)
}

/// Map a non-success answer from the service, keeping its status and body.
/// Only 4xx/5xx are forwarded; anything else could not carry the envelope.
fn remote_rejection(status: u16, body: Value, fallback_error: &str) -> (StatusCode, ResponseEnvelope) {
    let code = StatusCode::from_u16(status)
        .ok()
        .filter(|code| code.is_client_error() || code.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or(fallback_error)
        .to_string();
    (code, Failure::new(error).with_details(body).into())
}
