use thiserror::Error;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::{reject::Reject, Rejection, Reply};

use crate::models::Failure;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request body of {0} bytes exceeds the {1} byte limit")]
    BodyTooLarge(u64, u64),

    #[error("Metrics encoding error: {0}")]
    MetricsEncoding(#[from] prometheus::Error),

    #[error("Metrics output is not valid UTF-8: {0}")]
    MetricsUtf8(#[from] std::string::FromUtf8Error),
}

impl Reject for ApiError {}

/// Turn every rejection into the failure envelope so clients keep a single
/// parsing path. Never returns `Err`.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    let (code, failure) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, Failure::new("Not found"))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!("Rejected malformed request body: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Failure::new("Invalid request body").with_message(e.to_string()),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Failure::new("Unsupported media type").with_message("Expected application/json"),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, Failure::new("Method not allowed"))
    } else if let Some(e) = err
        .find::<ApiError>()
        .filter(|e| matches!(e, ApiError::BodyTooLarge(..)))
    {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            Failure::new("Request body too large").with_message(e.to_string()),
        )
    } else if let Some(api_err) = err.find::<ApiError>() {
        error!("Request failed: {}", api_err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Failure::new("Internal server error").with_message(api_err.to_string()),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, Failure::new("Internal server error"))
    };

    Ok(warp::reply::with_status(warp::reply::json(&failure), code))
}
