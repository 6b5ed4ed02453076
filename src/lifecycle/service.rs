//! The proxy service as an owned value with explicit start/stop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::startup::{reclaim_port, LsofReclaimer, NoopReclaimer, PortReclaimer};
use crate::lifecycle::state::{InvalidTransition, ServiceState, StateCell};
use crate::net::{self, ListenerError};
use crate::upstream::{InvalidOrigin, UpstreamClient};

/// Fatal startup failures. The process exits 1 on any of these.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("Failed to build upstream client: {0}")]
    Client(#[from] InvalidOrigin),
    #[error(transparent)]
    Lifecycle(#[from] InvalidTransition),
}

/// Failures while running or stopping a started service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Lifecycle(#[from] InvalidTransition),
}

/// A configured but not yet listening proxy.
pub struct ProxyService {
    config: ProxyConfig,
    reclaimer: Arc<dyn PortReclaimer>,
    state: StateCell,
}

impl ProxyService {
    /// Create a service; the port reclaimer follows `listener.reclaim_port`.
    pub fn new(config: ProxyConfig) -> Self {
        let reclaimer: Arc<dyn PortReclaimer> = if config.listener.reclaim_port {
            Arc::new(LsofReclaimer)
        } else {
            Arc::new(NoopReclaimer)
        };

        Self {
            config,
            reclaimer,
            state: StateCell::new(),
        }
    }

    /// Replace the port reclaimer.
    pub fn with_reclaimer(mut self, reclaimer: impl PortReclaimer + 'static) -> Self {
        self.reclaimer = Arc::new(reclaimer);
        self
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn state(&self) -> ServiceState {
        self.state.current()
    }

    /// Reclaim the port, bind, and start serving in a background task.
    pub async fn start(self) -> Result<RunningService, StartupError> {
        let ProxyService {
            config,
            reclaimer,
            state,
        } = self;

        tracing::info!("Starting proxy server...");

        let port = config.listener.port;
        if let Err(e) = tokio::task::spawn_blocking(move || reclaim_port(reclaimer.as_ref(), port)).await {
            tracing::warn!(error = %e, "Port reclaim task failed, continuing");
        }

        let upstream = match UpstreamClient::new(&config.upstream) {
            Ok(upstream) => upstream,
            Err(e) => {
                state.advance(ServiceState::Stopped)?;
                return Err(e.into());
            }
        };

        let listener = match net::bind(&config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                state.advance(ServiceState::Stopped)?;
                return Err(e.into());
            }
        };
        let local_addr = listener.local_addr().map_err(ListenerError::from)?;

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config, upstream);
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

        state.advance(ServiceState::Listening)?;
        tracing::info!("Proxy server running at http://{}", local_addr);
        tracing::info!("Ready to handle requests");

        Ok(RunningService {
            local_addr,
            shutdown,
            handle,
            state,
        })
    }
}

/// A listening proxy. Dropping it without [`RunningService::stop`] also
/// shuts the server down, since the shutdown channel closes.
pub struct RunningService {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
    state: StateCell,
}

impl RunningService {
    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServiceState {
        self.state.current()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// Stop accepting connections, let in-flight responses finish, and wait
    /// for the server task to end.
    pub async fn stop(self) -> Result<(), ServiceError> {
        self.state.advance(ServiceState::ShuttingDown)?;
        let listeners = self.shutdown.trigger();
        tracing::debug!(listeners, "Shutdown signalled");

        let result = self.handle.await;
        self.state.advance(ServiceState::Stopped)?;
        result??;
        Ok(())
    }

    /// Serve until `signal` resolves, then stop gracefully.
    ///
    /// If the server task ends on its own first, the service is still moved
    /// to `Stopped` and the task's error is returned.
    pub async fn run_until(mut self, signal: impl Future<Output = ()>) -> Result<(), ServiceError> {
        let finished = tokio::select! {
            () = signal => None,
            result = &mut self.handle => Some(result),
        };

        match finished {
            None => self.stop().await,
            Some(result) => {
                tracing::warn!("Server task ended before a shutdown signal");
                self.state.advance(ServiceState::ShuttingDown)?;
                self.state.advance(ServiceState::Stopped)?;
                result??;
                Ok(())
            }
        }
    }
}
