//! Command strategies
//!
//! Once a command request has been decoded the session builds the matching
//! [`Relay`], tells the client where the relay is bound, and hands its
//! connection over. From then on the relay owns the client connection and
//! is the only thing that closes it.

mod bind;
mod connect;
mod udp;

pub use bind::BindRelay;
pub use connect::ConnectRelay;
pub use udp::UdpRelay;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::socks::{AddressSpec, CommandRequest, ErrorSink, ProxyStream, SocksCommand};
use std::fmt::Debug;
use std::net::IpAddr;
use std::time::Duration;

/// Common start/stop contract of the three command strategies
pub trait Relay: Send + Debug {
    /// Endpoint reported to the client in the command response
    fn bound_address(&self) -> (AddressSpec, u16);

    /// Begin relaying in the background
    ///
    /// Returns immediately. Failures encountered later are pushed onto
    /// `errors`.
    fn start(&mut self, client: Box<dyn ProxyStream>, errors: ErrorSink);

    /// Release every socket, listener and task the relay owns
    fn stop(&mut self);
}

/// Everything a relay needs to know about the server it runs in
#[derive(Debug, Clone)]
pub struct RelayContext {
    /// Timeout for CONNECT dials
    pub connect_timeout: Duration,
    /// Endpoint BIND listeners are opened on
    pub bind_addr: String,
    /// Endpoint UDP sockets are bound to
    pub udp_bind_addr: String,
    /// Local IP of the client's control connection
    pub local_ip: IpAddr,
}

impl RelayContext {
    /// Derive a context from the server configuration
    pub fn new(config: &ServerConfig, local_ip: IpAddr) -> Self {
        RelayContext {
            connect_timeout: config.connect_timeout(),
            bind_addr: config.bind_addr.clone(),
            udp_bind_addr: config.udp_bind_addr.clone(),
            local_ip,
        }
    }
}

/// Build the relay matching a decoded request
pub async fn build_relay(request: &CommandRequest, ctx: &RelayContext) -> Result<Box<dyn Relay>> {
    let relay: Box<dyn Relay> = match request.command {
        SocksCommand::Connect => Box::new(
            ConnectRelay::connect(&request.destination, request.port, ctx.connect_timeout).await?,
        ),
        SocksCommand::Bind => Box::new(BindRelay::listen(&ctx.bind_addr).await?),
        SocksCommand::UdpAssociate => {
            Box::new(UdpRelay::bind(&ctx.udp_bind_addr, ctx.local_ip).await?)
        }
    };
    Ok(relay)
}
