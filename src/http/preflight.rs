//! Local CORS preflight answers.
//!
//! `OPTIONS` under the forwarded prefix never reaches upstream. The answer
//! follows the usual permissive middleware defaults: any origin, the common
//! methods, and whatever headers the browser asked for.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Methods advertised on preflight answers.
pub const PREFLIGHT_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Build the preflight response for the given request headers.
pub fn preflight_response(request_headers: &HeaderMap) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_METHODS),
    );

    if let Some(requested) = request_headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.insert(
            header::VARY,
            HeaderValue::from_static("Access-Control-Request-Headers"),
        );
    }

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));

    (StatusCode::NO_CONTENT, headers).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflects_requested_headers() {
        let mut request = HeaderMap::new();
        request.insert(
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("authorization, x-stainless-lang"),
        );

        let response = preflight_response(&request);

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], PREFLIGHT_METHODS);
        assert_eq!(
            headers["access-control-allow-headers"],
            "authorization, x-stainless-lang"
        );
        assert_eq!(headers["vary"], "Access-Control-Request-Headers");
    }

    #[test]
    fn omits_allow_headers_when_nothing_requested() {
        let response = preflight_response(&HeaderMap::new());
        assert!(response
            .headers()
            .get("access-control-allow-headers")
            .is_none());
        assert!(response.headers().get("vary").is_none());
    }
}
