//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, prefix routing)
//!     → preflight.rs (OPTIONS answered locally)
//!     → request.rs (header whitelist, upstream URL)
//!     → [upstream client sends the request]
//!     → response.rs (copy headers, CORS override, stream body)
//!     → Send to client
//!
//! Any failure on the way → error.rs (fixed JSON shapes, status 500)
//! ```

pub mod error;
pub mod preflight;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use request::FORWARDED_HEADERS;
pub use server::{build_router, HttpServer};
