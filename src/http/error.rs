//! Request-boundary errors.
//!
//! Every failure while handling a request ends here and is turned into a
//! 500 with a JSON body. Nothing is retried.

use std::any::Any;
use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Message shown to callers when upstream could not be reached.
pub const PROXY_FAILURE_MESSAGE: &str = "Failed to proxy request";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Network-level failure talking to upstream (refused, DNS, TLS, ...).
    #[error("{}", error_chain(.0))]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The outbound request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    /// Upstream did not answer before the deadline.
    #[error("upstream did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// The inbound body could not be read (or exceeded the size limit).
    #[error("failed to read request body: {}", error_chain(.0))]
    InboundBody(#[from] axum::Error),
}

impl ProxyError {
    fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::Upstream(_) | ProxyError::Request(_) | ProxyError::Timeout(_)
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let details = self.to_string();
        let body = if self.is_upstream_failure() {
            tracing::error!(error = %details, "Proxy error");
            json!({
                "error": {
                    "message": PROXY_FAILURE_MESSAGE,
                    "details": details,
                }
            })
        } else {
            tracing::error!(error = %details, "Request handling failed");
            json!({ "error": details })
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Render an error and its sources as one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

/// Fallback for panics inside handlers, installed through `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "Internal server error".to_string()
    };

    tracing::error!(error = %message, "Global error handler");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn timeout_uses_fixed_failure_shape() {
        let response = ProxyError::Timeout(Duration::from_secs(30)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Failed to proxy request");
        assert_eq!(
            body["error"]["details"],
            "upstream did not respond within 30s"
        );
    }

    #[tokio::test]
    async fn inbound_body_error_uses_handler_fault_shape() {
        let err = ProxyError::InboundBody(axum::Error::new(std::io::Error::other("length limit exceeded")));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("length limit exceeded"));
    }

    #[tokio::test]
    async fn panic_payload_becomes_message() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": "boom" }));

        let response = handle_panic(Box::new(String::from("kaboom")));
        assert_eq!(body_json(response).await, json!({ "error": "kaboom" }));
    }

    #[test]
    fn error_chain_includes_sources() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::other("connection refused"));
        assert_eq!(error_chain(&err), "outer: connection refused");
    }
}
