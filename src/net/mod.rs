//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (bind, classify failures)
//!     → TcpListener handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind failures are fatal and never retried
//! - Address-in-use gets its own variant so the operator sees why

pub mod listener;

pub use listener::{bind, ListenerError};
