//! # Request ID Middleware
//!
//! Tags each request with an id, either the caller's `X-Request-ID` or a new
//! one, and echoes it on the response. Error bodies carry it as `requestId`.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use error::attach_request_id;
use logging::{request_id::REQUEST_ID_HEADER, RequestId};
use tracing::Instrument;

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_header_or_new(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );
    let response = next.run(request).instrument(span).await;
    let mut response = attach_request_id(response, request_id.as_str());

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
