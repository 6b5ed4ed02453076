//! Forwarding proxy library.
//!
//! Relays every request under a path prefix to one fixed upstream origin,
//! forwarding only whitelisted request headers and streaming the upstream
//! response back with CORS headers added.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::{ProxyService, RunningService, Shutdown};
