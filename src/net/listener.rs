//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured host and port
//! - Bind the listening socket
//! - Classify bind failures so startup can report them precisely

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The configured host/port is not a socket address.
    #[error("Invalid bind address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: std::net::AddrParseError,
    },
    /// Another socket already holds the port.
    #[error("Port {port} is already in use")]
    AddrInUse { port: u16, source: std::io::Error },
    /// Any other bind failure.
    #[error("Failed to bind: {0}")]
    Bind(#[from] std::io::Error),
}

/// Bind a TCP listener on the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr = config
        .bind_address()
        .map_err(|source| ListenerError::InvalidAddress {
            address: config.host.clone(),
            source,
        })?;

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            ListenerError::AddrInUse {
                port: config.port,
                source: e,
            }
        } else {
            ListenerError::Bind(e)
        }
    })?;

    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> ListenerConfig {
        ListenerConfig {
            host: host.to_string(),
            port,
            reclaim_port: false,
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind(&config("127.0.0.1", 0)).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn binds_ipv6_loopback() {
        // Hosts without IPv6 support cannot run this check.
        if std::net::TcpListener::bind("[::1]:0").is_err() {
            return;
        }
        let listener = bind(&config("::1", 0)).await.unwrap();
        assert!(listener.local_addr().unwrap().is_ipv6());
    }

    #[tokio::test]
    async fn reports_port_in_use() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = held.local_addr().unwrap().port();

        match bind(&config("127.0.0.1", port)).await {
            Err(ListenerError::AddrInUse { port: p, .. }) => assert_eq!(p, port),
            other => panic!("expected AddrInUse, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn rejects_unparseable_host() {
        let err = bind(&config("not-an-ip", 8080)).await.unwrap_err();
        assert!(matches!(err, ListenerError::InvalidAddress { .. }));
    }
}
