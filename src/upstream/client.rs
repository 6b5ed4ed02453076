//! Client for the fixed upstream origin.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;
use crate::http::error::ProxyError;
use crate::http::request::upstream_uri;

/// The configured base URL is not an absolute http(s) origin.
#[derive(Debug, thiserror::Error)]
#[error("upstream origin '{0}' must be an absolute http or https URL")]
pub struct InvalidOrigin(String);

/// HTTP(S) client bound to a single origin.
///
/// Built once at startup and shared by every request. The pool lives inside
/// the hyper client, so clones share connections.
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client<HttpsConnector<HttpConnector>, Body>,
    origin: Uri,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, InvalidOrigin> {
        let origin = parse_origin(&config.base_url)?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(config.connect_timeout()));

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(http);

        // No default headers: the request carries exactly what the caller sent
        // through the whitelist, plus the Host hyper derives from the origin.
        let http_client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            http_client,
            origin,
            timeout: config.timeout(),
        })
    }

    pub fn origin(&self) -> &Uri {
        &self.origin
    }

    /// Send one request upstream and wait for its response headers.
    ///
    /// The deadline covers connecting and the response head only; the body
    /// is streamed afterwards without a time limit.
    pub async fn send(
        &self,
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<Response<Incoming>, ProxyError> {
        let target = upstream_uri(&self.origin, uri)?;

        tracing::info!(target_url = %target, "Forwarding request");
        tracing::debug!(headers = ?headers, "Forwarded headers");

        let mut request = Request::builder()
            .method(method)
            .uri(target)
            .body(body.map(Body::from).unwrap_or_else(Body::empty))?;
        *request.headers_mut() = headers;

        match tokio::time::timeout(self.timeout, self.http_client.request(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProxyError::Timeout(self.timeout)),
        }
    }
}

fn parse_origin(raw: &str) -> Result<Uri, InvalidOrigin> {
    let uri: Uri = raw.parse().map_err(|_| InvalidOrigin(raw.to_string()))?;
    match (uri.scheme_str(), uri.authority()) {
        (Some("http" | "https"), Some(_)) => Ok(uri),
        _ => Err(InvalidOrigin(raw.to_string())),
    }
}
