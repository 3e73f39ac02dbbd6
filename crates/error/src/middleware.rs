//! # Error Handling Middleware
//!
//! Conversion of [`AppError`] into HTTP responses.
//!
//! ```rust
//! use error::{error_response, AppError};
//!
//! let response = error_response(&AppError::unauthorized("Invalid user name or password."));
//! assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
//! ```

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{response::ApiResponse, AppError};

/// Convert an error to a response.
///
/// Server-side failures are logged and their details replaced by a generic
/// message. The envelope is also stored in the response extensions so that
/// [`attach_request_id`] can re-render it.
pub fn error_response(err: &AppError) -> Response {
    let status = err.status();
    let message = if status.is_client_error() {
        err.message()
    }
    else {
        match status {
            StatusCode::BAD_GATEWAY => "Identity service unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    };

    if status.is_server_error() {
        tracing::error!(error = %err, code = err.code(), "Request failed");
    }

    let body = ApiResponse::<()>::error(err.code(), message);
    let mut response = (
        status,
        [(header::CACHE_CONTROL, "no-store")],
        Json(body.clone()),
    )
        .into_response();
    response.extensions_mut().insert(body);
    response
}

/// Add `request_id` to the body of an error response built by
/// [`error_response`]. Any other response is returned unchanged.
pub fn attach_request_id(response: Response, request_id: &str) -> Response {
    let (mut parts, body) = response.into_parts();
    match parts.extensions.remove::<ApiResponse<()>>() {
        Some(envelope) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            let (_, body) = Json(envelope.with_request_id(request_id))
                .into_response()
                .into_parts();
            Response::from_parts(parts, body)
        },
        None => Response::from_parts(parts, body),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response { error_response(&self) }
}
