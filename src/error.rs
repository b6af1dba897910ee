//! Error types for Socksrelay
//!
//! Decode failures are reported as [`ProtocolError`] so callers can tell the
//! kinds apart; everything a session or relay can fail with is wrapped in
//! [`SocksError`].

use crate::socks::StatusCode;
use std::io;
use thiserror::Error;

/// Result alias used throughout the protocol engine
pub type Result<T> = std::result::Result<T, SocksError>;

/// Wire-format errors raised while decoding or encoding SOCKS5 messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// First byte of a message was not 0x05
    #[error("Mismatched socks version: {0}")]
    MismatchedSocksVersion(u8),

    /// Message is truncated or its length fields point past the buffer
    #[error("Message is malformed")]
    MalformedMessage,

    /// Method identifier outside the IANA catalog (or reserved 0x04)
    #[error("Unknown auth method: {0}")]
    UnknownAuthMethod(u8),

    /// Reserved field carried a non-zero value
    #[error("Invalid reserved field: {0}")]
    InvalidReservedField(u16),

    /// ATYP other than IPv4, domain name or IPv6
    #[error("Invalid address type: {0}")]
    InvalidAddressType(u8),

    /// CMD outside CONNECT/BIND/UDP ASSOCIATE
    #[error("Invalid command: {0}")]
    InvalidCommand(u8),

    /// Reply status above the reserved range
    #[error("Invalid status: {0}")]
    InvalidStatus(u8),

    /// Address text that cannot be put on the wire
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Main error type for session, client and relay operations
#[derive(Error, Debug)]
pub enum SocksError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol decode/encode error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Command issued before authentication completed
    #[error("client is not authenticated")]
    NotAuthenticated,

    /// Operation not permitted in the current session state
    #[error("Unexpected state: {0}")]
    UnexpectedState(String),

    /// Server replied to a command with a non-success status
    #[error("server didn't respond with success, responded with {0:?}")]
    CommandFailed(StatusCode),

    /// Outbound dial did not complete in time
    #[error("Connection timeout: {0}")]
    ConnectTimeout(String),

    /// Domain name could not be resolved
    #[error("Failed to resolve: {0}")]
    Resolve(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SocksError {
    /// Returns the decode error kind if this is a protocol failure
    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            SocksError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<&io::Error> for StatusCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => StatusCode::ConnectionRefused,
            io::ErrorKind::TimedOut => StatusCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => StatusCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => StatusCode::ConnectionNotAllowed,
            _ => StatusCode::ServerFailure,
        }
    }
}
