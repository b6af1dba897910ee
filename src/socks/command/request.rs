//! Command request sent by the client

use super::{check_frame, decode_endpoint, encode_frame};
use crate::error::ProtocolError;
use crate::socks::address::AddressSpec;
use crate::socks::types::SocksCommand;
use std::fmt;

/// A CONNECT, BIND or UDP ASSOCIATE request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Requested command
    pub command: SocksCommand,
    /// Destination address
    pub destination: AddressSpec,
    /// Destination port
    pub port: u16,
}

impl CommandRequest {
    /// Create a new request
    pub fn new(command: SocksCommand, destination: AddressSpec, port: u16) -> Self {
        CommandRequest {
            command,
            destination,
            port,
        }
    }

    /// Encode to wire format
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_frame(self.command.to_byte(), &self.destination, self.port)
    }

    /// Decode from wire format
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        check_frame(buf)?;
        let command = SocksCommand::try_from(buf[1])?;
        let (destination, port) = decode_endpoint(buf)?;
        Ok(CommandRequest {
            command,
            destination,
            port,
        })
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.command, self.destination, self.port)
    }
}
