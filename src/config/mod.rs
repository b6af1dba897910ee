//! Configuration module for Socksrelay
//!
//! TOML configuration for the proxy server. Every field has a default, so
//! an empty file (or no file at all) yields a working setup.

mod server;

pub use server::{Config, ServerConfig};

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    config
        .server
        .validate()
        .with_context(|| "Invalid server configuration")?;
    Ok(config)
}
