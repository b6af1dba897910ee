//! Server configuration types

use crate::error::{Result, SocksError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

fn default_listen_addr() -> String {
    "127.0.0.1:1080".to_string()
}

/// Default CONNECT dial timeout in seconds
fn default_connect_timeout() -> u64 {
    5
}

/// Default delay before a failed session is force-closed, in seconds
fn default_grace_period() -> u64 {
    5
}

fn default_bind_addr() -> String {
    "127.0.0.1:8877".to_string()
}

fn default_udp_bind_addr() -> String {
    "0.0.0.0:0".to_string()
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Proxy server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Proxy server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the proxy accepts clients on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Timeout for outbound CONNECT dials, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Delay between reporting an error and closing the client, in seconds
    #[serde(default = "default_grace_period")]
    pub grace_period: u64,

    /// Endpoint BIND listeners are opened on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Endpoint UDP ASSOCIATE sockets are bound to
    #[serde(default = "default_udp_bind_addr")]
    pub udp_bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connect_timeout: default_connect_timeout(),
            grace_period: default_grace_period(),
            bind_addr: default_bind_addr(),
            udp_bind_addr: default_udp_bind_addr(),
        }
    }
}

impl ServerConfig {
    /// Dial timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Grace period as a [`Duration`]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("listen_addr", &self.listen_addr),
            ("bind_addr", &self.bind_addr),
            ("udp_bind_addr", &self.udp_bind_addr),
        ] {
            value.parse::<SocketAddr>().map_err(|e| {
                SocksError::Config(format!("Invalid {} '{}': {}", name, value, e))
            })?;
        }
        if self.connect_timeout == 0 {
            return Err(SocksError::Config(
                "connect_timeout must be greater than zero".to_string(),
            ));
        }
        if self.grace_period == 0 {
            return Err(SocksError::Config(
                "grace_period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
