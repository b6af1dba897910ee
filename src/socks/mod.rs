//! SOCKS5 wire protocol
//!
//! Message codecs shared by the server and the client, plus the splicer
//! used to relay TCP streams once a command has been accepted.

pub mod address;
pub mod auth;
pub mod command;
pub mod consts;
pub mod splice;
pub mod types;
pub mod udp;

#[cfg(test)]
pub(crate) mod strategies;

pub use address::AddressSpec;
pub use auth::{select_method, AuthMethodAccept, AuthMethodsOffer};
pub use command::{read_command_response, CommandRequest, CommandResponse};
pub use splice::{error_channel, splice, ErrorSink, ErrorSource};
pub use types::{AddressType, AuthMethod, SocksCommand, StatusCode};
pub use udp::UdpDatagram;

use std::fmt::Debug;
use tokio::io::{AsyncRead, AsyncWrite};

/// Byte stream a session can run over
///
/// Blanket-implemented for anything readable, writable and sendable, so a
/// `TcpStream` and an in-memory `DuplexStream` both qualify.
pub trait ProxyStream: AsyncRead + AsyncWrite + Unpin + Send + Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Debug> ProxyStream for T {}
