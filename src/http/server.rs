//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the forwarding handler
//! - Wire up middleware (tracing, CORS origin on every response, panic fallback)
//! - Answer preflight requests locally, inside or outside the prefix
//! - Refuse paths with dot segments
//! - Forward everything else under the prefix upstream
//! - Serve until the shutdown signal, then drain

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::config::{ForwardingConfig, ProxyConfig};
use crate::http::error::{handle_panic, ProxyError};
use crate::http::preflight::preflight_response;
use crate::http::request::{has_dot_segment, outbound_headers};
use crate::http::response::relay;
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub max_body_bytes: usize,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig, upstream: UpstreamClient) -> Self {
        let router = build_router(&config.forwarding, upstream);
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. In-flight responses are allowed to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            prefix = %self.config.forwarding.path_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutting down gracefully...");
            })
            .await?;

        tracing::info!("Server closed");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &ForwardingConfig, upstream: UpstreamClient) -> Router {
    let state = AppState {
        upstream,
        max_body_bytes: config.max_body_bytes,
    };
    let prefix = &config.path_prefix;

    Router::new()
        .route(&format!("{}/{{*path}}", prefix), any(proxy_handler))
        .route(&format!("{}/", prefix), any(proxy_handler))
        .fallback(outside_prefix)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Relayed and preflight responses set their own; this covers
                // errors, panics and 404s.
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

/// Entry point for every request under the prefix.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "Answering preflight");
        return Ok(preflight_response(request.headers()));
    }

    if has_dot_segment(request.uri().path()) {
        tracing::warn!(path = %request.uri().path(), "Refusing path with dot segments");
        return Ok(not_found(request.method(), request.uri()));
    }

    forward(&state, request).await
}

/// Forward one request upstream and relay the answer.
async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    tracing::info!(method = %parts.method, path = %parts.uri, "Incoming request");
    tracing::debug!(headers = ?parts.headers, "Incoming headers");

    let headers = outbound_headers(&parts.method, &parts.headers);

    let body = axum::body::to_bytes(body, state.max_body_bytes).await?;
    let body = if body.is_empty() {
        None
    } else {
        tracing::debug!(bytes = body.len(), "Request body");
        Some(body)
    };

    let upstream = state
        .upstream
        .send(parts.method, &parts.uri, headers, body)
        .await?;

    Ok(relay(upstream))
}

/// Requests outside the prefix: preflights are still answered, the rest 404.
async fn outside_prefix(request: Request<Body>) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response(request.headers());
    }
    not_found(request.method(), request.uri())
}

fn not_found(method: &Method, uri: &Uri) -> Response {
    tracing::debug!(method = %method, path = %uri.path(), "No route matched");
    (
        StatusCode::NOT_FOUND,
        format!("Cannot {} {}", method, uri.path()),
    )
        .into_response()
}
