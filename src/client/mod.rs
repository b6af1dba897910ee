//! SOCKS5 client
//!
//! A minimal client matching the server: it offers methods, issues one
//! command and then exposes the connection as a byte stream.
//!
//! ```rust,ignore
//! use socksrelay::client::Socks5Client;
//! use socksrelay::socks::AuthMethod;
//!
//! let mut client = Socks5Client::dial("127.0.0.1:1080").await?;
//! client.connect(&[AuthMethod::NoAuth]).await?;
//! client.connect_request("93.184.216.34", 80).await?;
//! let stream = client.into_stream()?;
//! ```

mod session;

pub use session::{ClientState, Socks5Client};
