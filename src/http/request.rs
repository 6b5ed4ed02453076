//! Outbound request preparation.
//!
//! # Responsibilities
//! - Hold the header whitelist
//! - Build the outbound header set from the inbound one
//! - Build the upstream URI from the fixed origin and the inbound path
//! - Spot paths that would climb out of the forwarded prefix
//!
//! # Design Decisions
//! - Whitelist, not blacklist: anything not named here never leaves the proxy
//! - Header values are copied untouched, every value of a repeated header
//! - The inbound path and query are reused as parsed, never re-encoded or
//!   normalized

use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// Request headers eligible for forwarding upstream.
pub const FORWARDED_HEADERS: [&str; 6] = [
    "authorization",
    "content-type",
    "content-length",
    "accept",
    "openai-organization",
    "user-agent",
];

/// Build the headers sent upstream.
///
/// Only whitelisted headers survive. POST requests always go out as JSON,
/// whatever content type the caller declared.
pub fn outbound_headers(method: &Method, inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in FORWARDED_HEADERS {
        for value in inbound.get_all(name) {
            headers.append(HeaderName::from_static(name), value.clone());
        }
    }

    if method == Method::POST {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    headers
}

/// Put the inbound path and query onto the upstream origin.
///
/// `origin` carries the scheme and authority; its own path is discarded.
pub fn upstream_uri(origin: &Uri, inbound: &Uri) -> Result<Uri, axum::http::Error> {
    let mut parts = origin.clone().into_parts();
    parts.path_and_query = Some(
        inbound
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/")),
    );
    Ok(Uri::from_parts(parts)?)
}

/// Whether any segment of `path` is `.` or `..`, literally or percent-encoded.
///
/// Such paths are resolved differently by different servers, so they are
/// never forwarded.
pub fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
