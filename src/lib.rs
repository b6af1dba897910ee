//! # Socksrelay - SOCKS5 proxy server and client
//!
//! Socksrelay implements the SOCKS5 protocol on both ends of the wire: a
//! server that accepts clients and relays their traffic, and a client that
//! drives a connection through a proxy.
//!
//! ## Features
//!
//! - **CONNECT**: outbound TCP connections spliced with the client
//! - **BIND**: one inbound TCP connection accepted on the client's behalf
//! - **UDP ASSOCIATE**: encapsulated datagrams forwarded request/reply style
//! - **Typed codecs**: every message decodes to a struct or a [`ProtocolError`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksrelay::config::load_config;
//! use socksrelay::server::Socks5Server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     Socks5Server::new(config.server).run(shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TcpListener -> ServerSession -> Relay (connect | bind | udp) -> Target
//! ```
//!
//! A session reads the method offer and one command, then hands its
//! connection to the relay built for that command.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use client::Socks5Client;
pub use config::{load_config, Config, ServerConfig};
pub use error::{ProtocolError, Result, SocksError};
pub use server::{ServerSession, Socks5Server};

/// Version of the Socksrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
