//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! filtered request (http::request)
//!     → client.rs (TLS connection to the fixed origin, deadline on the head)
//!     → hyper Response<Incoming> handed to http::response for relay
//! ```
//!
//! # Design Decisions
//! - One origin, one shared client
//! - Timeouts are surfaced as proxy errors, never retried

pub mod client;

pub use client::{InvalidOrigin, UpstreamClient};
