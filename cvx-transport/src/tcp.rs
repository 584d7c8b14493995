//! TCP transport implementation

use cvx_core::{CvxError, CvxResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP transport layer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpSettings {
    pub address: SocketAddr,
    pub connect_timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings with the default 5 second connect timeout
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            connect_timeout: Some(Duration::from_secs(5)),
        }
    }

    /// Create TCP settings with an explicit connect timeout
    pub fn with_timeout(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            address,
            connect_timeout: Some(timeout),
        }
    }
}

/// TCP transport layer implementation
pub struct TcpTransport;

impl TcpTransport {
    /// Open a connection to the controller.
    ///
    /// The attempt is bounded by `connect_timeout` when one is set.
    /// Nagle's algorithm is disabled on the resulting stream; the
    /// protocol is strictly one short request line per reply, so delayed
    /// segments only add latency.
    ///
    /// # Errors
    /// Returns `CvxError::Timeout` when the connect timeout elapses and
    /// `CvxError::Connection` for socket-level failures.
    pub async fn connect(settings: &TcpSettings) -> CvxResult<TcpStream> {
        let stream = if let Some(timeout) = settings.connect_timeout {
            tokio::time::timeout(timeout, TcpStream::connect(settings.address))
                .await
                .map_err(|_| CvxError::Timeout)?
                .map_err(CvxError::Connection)?
        } else {
            TcpStream::connect(settings.address)
                .await
                .map_err(CvxError::Connection)?
        };

        stream.set_nodelay(true).map_err(CvxError::Connection)?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_settings() {
        let addr: SocketAddr = "127.0.0.1:8500".parse().unwrap();
        let settings = TcpSettings::new(addr);
        assert_eq!(settings.address, addr);
        assert!(settings.connect_timeout.is_some());
    }

    #[tokio::test]
    async fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let settings = TcpSettings::new(listener.local_addr().unwrap());
        let stream = TcpTransport::connect(&settings).await.unwrap();
        assert!(stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_connect_timeout_expires() {
        // RFC 5737 TEST-NET address, nothing routes there
        let addr: SocketAddr = "192.0.2.1:8500".parse().unwrap();
        let settings = TcpSettings::with_timeout(addr, Duration::from_millis(50));
        match TcpTransport::connect(&settings).await {
            Err(CvxError::Timeout) | Err(CvxError::Connection(_)) => {}
            other => panic!("expected connect failure, got {:?}", other.map(|_| ())),
        }
    }
}
