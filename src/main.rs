//! Forwarding Proxy (v1)
//!
//! A single-origin forwarding proxy built with Tokio, Axum and hyper.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 FORWARDING PROXY                  │
//!                      │                                                   │
//!   Client Request     │  ┌──────────┐   ┌───────────┐   ┌─────────────┐  │
//!   ───────────────────┼─▶│   net    │──▶│   http    │──▶│   header    │  │
//!                      │  │ listener │   │  server   │   │  whitelist  │  │
//!                      │  └──────────┘   └─────┬─────┘   └──────┬──────┘  │
//!                      │        OPTIONS ◀──────┘                │         │
//!                      │       (preflight)                      ▼         │
//!   Client Response    │  ┌──────────┐                   ┌─────────────┐  │
//!   ◀──────────────────┼──│ response │◀──────────────────│  upstream   │◀─┼── Upstream
//!                      │  │ relay+CORS│                  │ TLS client  │  │   Origin
//!                      │  └──────────┘                   └─────────────┘  │
//!                      │                                                   │
//!                      │  config · lifecycle (reclaim/signals) · logging   │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_forward_proxy::config::{self, ConfigError, ProxyConfig};
use api_forward_proxy::lifecycle::{shutdown_signal, ProxyService, StartupError};
use api_forward_proxy::net::ListenerError;
use api_forward_proxy::observability::init_logging;

#[derive(Parser)]
#[command(name = "api-forward-proxy")]
#[command(about = "Forwarding proxy for a single upstream API origin", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "FORWARD_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the upstream origin (e.g. https://api.openai.com).
    #[arg(short, long)]
    upstream: Option<String>,

    /// Do not kill other processes holding the listen port.
    #[arg(long)]
    no_reclaim_port: bool,
}

fn resolve_config(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(upstream) = &cli.upstream {
        config.upstream.base_url = upstream.clone();
    }
    if cli.no_reclaim_port {
        config.listener.reclaim_port = false;
    }

    config::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.listener.host,
        port = config.listener.port,
        upstream = %config.upstream.base_url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        reclaim_port = config.listener.reclaim_port,
        "Configuration loaded"
    );

    let port = config.listener.port;
    let signal = shutdown_signal();
    tokio::pin!(signal);

    let running = tokio::select! {
        () = &mut signal => {
            tracing::info!("Shutdown requested before the listener was established");
            return ExitCode::SUCCESS;
        }
        result = ProxyService::new(config).start() => match result {
            Ok(running) => running,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start server");
                if let StartupError::Listener(ListenerError::AddrInUse { .. }) = e {
                    tracing::error!("Port {} is already in use. Please try a different port.", port);
                }
                return ExitCode::FAILURE;
            }
        },
    };

    match running.run_until(signal).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}
