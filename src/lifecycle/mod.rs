//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (service.rs, startup.rs):
//!     Reclaim port (optional) → Build upstream client → Bind → Serve
//!
//! Shutdown (service.rs, shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight responses → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The running server is an owned value, not a global
//! - Fail fast: any startup error is fatal
//! - Port reclaim is injectable and can be switched off

pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use service::{ProxyService, RunningService, ServiceError, StartupError};
pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{LsofReclaimer, NoopReclaimer, PortReclaimer, ReclaimOutcome};
pub use state::{InvalidTransition, ServiceState};
