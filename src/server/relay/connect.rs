//! CONNECT relay
//!
//! Dials the requested destination and splices it with the client.

use super::Relay;
use crate::error::{Result, SocksError};
use crate::socks::splice::{splice, AbortOnDrop, ErrorSink};
use crate::socks::{AddressSpec, ProxyStream, StatusCode};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, error, info};

/// Relay for an established outbound TCP connection
#[derive(Debug)]
pub struct ConnectRelay {
    target: SocketAddr,
    remote: Option<TcpStream>,
    task: Option<AbortOnDrop<()>>,
}

impl ConnectRelay {
    /// Resolve and dial the destination within `timeout`
    pub async fn connect(destination: &AddressSpec, port: u16, timeout: Duration) -> Result<Self> {
        let target = destination.resolve(port).await?;

        debug!("Connecting to target: {}", target);

        let remote = match tokio::time::timeout(timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!(
                    "Failed to connect to {}: {} ({:?})",
                    target,
                    e,
                    StatusCode::from(&e)
                );
                return Err(e.into());
            }
            Err(_) => {
                error!("Connection timeout to {}", target);
                return Err(SocksError::ConnectTimeout(target.to_string()));
            }
        };

        Ok(ConnectRelay {
            target,
            remote: Some(remote),
            task: None,
        })
    }
}

impl Relay for ConnectRelay {
    /// Always `0.0.0.0:0`; the local end of the outbound connection is not reported
    fn bound_address(&self) -> (AddressSpec, u16) {
        (AddressSpec::unspecified(), 0)
    }

    fn start(&mut self, client: Box<dyn ProxyStream>, errors: ErrorSink) {
        let Some(remote) = self.remote.take() else {
            let _ = errors.send(SocksError::UnexpectedState(
                "connect relay already started".to_string(),
            ));
            return;
        };

        info!("SOCKS5 tunnel established to {}", self.target);
        self.task = Some(AbortOnDrop(tokio::spawn(splice(client, remote, errors))));
    }

    fn stop(&mut self) {
        debug!("Stopping connect relay to {}", self.target);
        self.task = None;
        self.remote = None;
    }
}
