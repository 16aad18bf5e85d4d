//! Turning results into HTTP responses.
//!
//! Every error body is `{"message": ...}`. Validation failures carry a map of
//! field to message; everything else carries a string.

use serde::Serialize;
use serde_json::{json, Value};
use tide::http::mime;
use tide::{Body, Response, StatusCode};
use tracing::{debug, error};

use crate::error::Error;

/// Message returned when a user lookup misses.
pub const NOT_FOUND_MESSAGE: &str = "User Not Found!";

/// Message returned for unexpected failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// A JSON response with the given status.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> tide::Result {
    Ok(Response::builder(status)
        .body(Body::from_json(value)?)
        .build())
}

/// An HTML response with status 200.
#[must_use]
pub fn html(body: &str) -> Response {
    Response::builder(StatusCode::Ok)
        .body(body)
        .content_type(mime::HTML)
        .build()
}

/// An empty 204 response.
#[must_use]
pub fn no_content() -> Response {
    Response::new(StatusCode::NoContent)
}

/// The HTTP status an error maps to.
#[must_use]
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UserNotFound { .. } => StatusCode::NotFound,
        Error::DuplicateEmail { .. } => StatusCode::Conflict,
        Error::InvalidArguments(_) | Error::MalformedBody(_) => StatusCode::BadRequest,
        _ => StatusCode::InternalServerError,
    }
}

/// The JSON body an error maps to.
///
/// With `debug` set, server errors also carry the error text as `detail`.
#[must_use]
pub fn error_body(err: &Error, debug: bool) -> Value {
    match err {
        Error::UserNotFound { .. } => json!({ "message": NOT_FOUND_MESSAGE }),
        Error::InvalidArguments(errors) => json!({ "message": errors }),
        Error::DuplicateEmail { .. } | Error::MalformedBody(_) => {
            json!({ "message": err.to_string() })
        }
        _ if debug => json!({ "message": INTERNAL_ERROR_MESSAGE, "detail": err.to_string() }),
        _ => json!({ "message": INTERNAL_ERROR_MESSAGE }),
    }
}

/// Build the error response for `err`.
///
/// Rejected input is logged at debug level, anything else as an error.
///
/// # Errors
///
/// Returns an error only if the body cannot be serialized.
pub fn error(err: &Error, debug: bool) -> tide::Result {
    if err.is_client_error() {
        debug!("Request rejected: {}", err);
    } else {
        error!("Request failed: {}", err);
    }
    json(status_for(err), &error_body(err, debug))
}
