//! SOCKS5 proxy server
//!
//! Accepts TCP connections and runs one [`ServerSession`] per connection
//! on its own task.

pub mod relay;
pub mod session;

pub use relay::{BindRelay, ConnectRelay, Relay, RelayContext, UdpRelay};
pub use session::{ServerSession, ServerState};

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Listener-side bootstrap for the proxy
pub struct Socks5Server {
    config: Arc<ServerConfig>,
}

impl Socks5Server {
    /// Create a server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Socks5Server {
            config: Arc::new(config),
        }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the client-facing listener
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to listen on {}", self.config.listen_addr))
    }

    /// Listen on the configured address and serve until shutdown
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_rx).await
    }

    /// Accept connections from `listener` until shutdown
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<bool>,
    ) -> Result<()> {
        info!("SOCKS5 server listening on {}", listener.local_addr()?);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.spawn_session(stream, peer),
                        Err(e) => warn!("Failed to accept connection: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        let local_ip = match stream.local_addr() {
            Ok(addr) => addr.ip(),
            Err(e) => {
                warn!("Dropping connection from {}: {}", peer, e);
                return;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        debug!("Accepted connection from {}", peer);
        let session = ServerSession::new(stream, self.config.clone(), local_ip);
        tokio::spawn(session.run());
    }
}
