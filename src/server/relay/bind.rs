//! BIND relay
//!
//! Listens for a single inbound connection on behalf of the client. The
//! listener is open before the session answers the request, so the endpoint
//! in the first response is already connectable. When the peer arrives a
//! second response naming it is written to the client, then the two are
//! spliced.
//!
//! A client that hangs up before any peer arrives takes the listener down
//! with it. Bytes the client sends while waiting are passed on to the peer
//! once it connects.

use super::Relay;
use crate::error::{Result, SocksError};
use crate::socks::splice::{splice, AbortOnDrop, ErrorSink};
use crate::socks::{AddressSpec, CommandResponse, ProxyStream};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Relay that accepts one inbound peer
#[derive(Debug)]
pub struct BindRelay {
    local: SocketAddr,
    listener: Option<TcpListener>,
    task: Option<AbortOnDrop<()>>,
}

impl BindRelay {
    /// Open the listener on `addr`
    pub async fn listen(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        debug!("BIND listener open on {}", local);

        Ok(BindRelay {
            local,
            listener: Some(listener),
            task: None,
        })
    }
}

impl Relay for BindRelay {
    fn bound_address(&self) -> (AddressSpec, u16) {
        (self.local.ip().into(), self.local.port())
    }

    fn start(&mut self, client: Box<dyn ProxyStream>, errors: ErrorSink) {
        let Some(listener) = self.listener.take() else {
            let _ = errors.send(SocksError::UnexpectedState(
                "bind relay already started".to_string(),
            ));
            return;
        };

        self.task = Some(AbortOnDrop(tokio::spawn(accept_and_splice(
            listener, client, errors,
        ))));
    }

    fn stop(&mut self) {
        debug!("Stopping bind relay on {}", self.local);
        self.task = None;
        self.listener = None;
    }
}

async fn accept_and_splice(
    listener: TcpListener,
    mut client: Box<dyn ProxyStream>,
    errors: ErrorSink,
) {
    let mut early = Vec::new();
    let mut buf = [0u8; 1024];
    let (mut peer, peer_addr) = loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => break accepted,
                Err(e) => {
                    warn!("BIND accept failed: {}", e);
                    let _ = errors.send(e.into());
                    return;
                }
            },
            read = client.read(&mut buf) => match read {
                Ok(0) => {
                    info!("BIND client left before a peer connected");
                    return;
                }
                Ok(n) => early.extend_from_slice(&buf[..n]),
                Err(e) => {
                    debug!("BIND client failed while waiting for a peer: {}", e);
                    let _ = errors.send(e.into());
                    return;
                }
            },
        }
    };
    drop(listener);

    info!("BIND peer connected from {}", peer_addr);

    let notice = CommandResponse::success(peer_addr.ip().into(), peer_addr.port());
    let written = match notice.encode() {
        Ok(bytes) => client.write_all(&bytes).await.map_err(SocksError::from),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = written {
        let _ = errors.send(e);
        return;
    }

    if !early.is_empty() {
        if let Err(e) = peer.write_all(&early).await {
            let _ = errors.send(e.into());
            return;
        }
    }

    splice(client, peer, errors).await;
}
