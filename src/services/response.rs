//! HTTP response building helpers
//!
//! All handlers answer with JSON. Errors are `{"error": message}` with the
//! status taken from the `TrackerError` variant.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;

use crate::error::TrackerError;

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

pub fn created<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::CREATED, body)
}

pub fn no_content() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    json_response(StatusCode::NOT_FOUND, &serde_json::json!({ "error": message }))
}

pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    json_response(StatusCode::BAD_REQUEST, &serde_json::json!({ "error": message }))
}

pub fn method_not_allowed() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method not allowed" }),
    )
}

pub fn internal_error(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &serde_json::json!({ "error": message }),
    )
}

/// Map a `TrackerError` onto its HTTP status
pub fn error_status(error: &TrackerError) -> StatusCode {
    match error {
        TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
        TrackerError::InvalidInput(_) | TrackerError::Json(_) => StatusCode::BAD_REQUEST,
        TrackerError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a TrackerError to an appropriate HTTP response
pub fn error_response(error: TrackerError) -> Response<Full<Bytes>> {
    let status = error_status(&error);
    let message = match &error {
        TrackerError::NotFound(msg)
        | TrackerError::InvalidInput(msg)
        | TrackerError::Conflict(msg) => msg.clone(),
        TrackerError::Json(e) => format!("JSON error: {}", e),
        _ => error.to_string(),
    };

    json_response(status, &serde_json::json!({ "error": message }))
}

/// Wrap a service result into a 200 response
pub fn from_result<T: Serialize>(result: Result<T, TrackerError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => ok(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap a service result into a 201 response
pub fn from_created<T: Serialize>(result: Result<T, TrackerError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => created(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap a delete result: 204 when something was removed, 404 otherwise
pub fn from_deleted(result: Result<bool, TrackerError>, not_found_msg: &str) -> Response<Full<Bytes>> {
    match result {
        Ok(true) => no_content(),
        Ok(false) => not_found(not_found_msg),
        Err(e) => error_response(e),
    }
}
