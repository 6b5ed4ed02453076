//! Response relay back to the caller.
//!
//! # Responsibilities
//! - Copy the upstream status and every upstream header
//! - Override the CORS headers on the way out
//! - Stream the upstream body without buffering it
//!
//! # Design Decisions
//! - No response filtering: the caller sees what upstream sent, plus CORS
//! - Dropping the relayed body drops the upstream stream, which closes the
//!   upstream connection when the caller goes away

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use futures_util::TryStreamExt;
use hyper::body::Incoming;

use crate::http::request::FORWARDED_HEADERS;

/// Methods advertised on relayed responses.
pub const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Set the three CORS headers, replacing whatever upstream sent for them.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        allowed_headers_value(),
    );
}

fn allowed_headers_value() -> HeaderValue {
    // Whitelist names are lowercase ASCII tokens, always a valid value.
    HeaderValue::from_str(&FORWARDED_HEADERS.join(", "))
        .unwrap_or_else(|_| HeaderValue::from_static("*"))
}

/// Turn an upstream response into the response sent to the caller.
pub fn relay(upstream: Response<Incoming>) -> Response {
    let (parts, body) = upstream.into_parts();
    let mut headers = parts.headers;

    tracing::info!(status = %parts.status, "Proxy response");
    tracing::debug!(headers = ?headers, "Upstream response headers");

    apply_cors_headers(&mut headers);

    let stream = Body::new(body)
        .into_data_stream()
        .inspect_err(|e| tracing::warn!(error = %e, "Upstream body ended with an error"));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    response
}
