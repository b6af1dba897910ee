//! Command response sent by the server

use super::{check_frame, check_prefix, decode_endpoint, encode_frame};
use crate::error::{ProtocolError, Result};
use crate::socks::address::AddressSpec;
use crate::socks::consts::*;
use crate::socks::types::StatusCode;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reply to a command request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// Outcome of the request
    pub status: StatusCode,
    /// Address bound by the server for this command
    pub bound: AddressSpec,
    /// Port bound by the server for this command
    pub port: u16,
}

impl CommandResponse {
    /// Create a new response
    pub fn new(status: StatusCode, bound: AddressSpec, port: u16) -> Self {
        CommandResponse {
            status,
            bound,
            port,
        }
    }

    /// Success carrying the given bound endpoint
    pub fn success(bound: AddressSpec, port: u16) -> Self {
        Self::new(StatusCode::Success, bound, port)
    }

    /// Failure with placeholder endpoint `0.0.0.0:0`
    pub fn failure(status: StatusCode) -> Self {
        Self::new(status, AddressSpec::unspecified(), 0)
    }

    /// Encode to wire format
    pub fn encode(&self) -> std::result::Result<Vec<u8>, ProtocolError> {
        encode_frame(self.status.to_byte(), &self.bound, self.port)
    }

    /// Decode from wire format
    pub fn decode(buf: &[u8]) -> std::result::Result<Self, ProtocolError> {
        check_frame(buf)?;
        let status = StatusCode::try_from(buf[1])?;
        let (bound, port) = decode_endpoint(buf)?;
        Ok(CommandResponse {
            status,
            bound,
            port,
        })
    }
}

/// Read exactly one command response from a stream
///
/// The header is read first so that the variable-length address can be
/// sized; nothing past the port field is consumed, leaving any relayed
/// data that follows untouched in the stream.
pub async fn read_command_response<S>(stream: &mut S) -> Result<CommandResponse>
where
    S: AsyncRead + Unpin,
{
    let mut frame = vec![0u8; 4];
    stream.read_exact(&mut frame).await?;

    check_prefix(&frame)?;
    StatusCode::try_from(frame[1])?;

    let remaining = match frame[3] {
        SOCKS5_ADDR_TYPE_IPV4 => 4 + 2,
        SOCKS5_ADDR_TYPE_IPV6 => 16 + 2,
        SOCKS5_ADDR_TYPE_DOMAIN => {
            let len = stream.read_u8().await?;
            frame.push(len);
            len as usize + 2
        }
        other => return Err(ProtocolError::InvalidAddressType(other).into()),
    };

    let start = frame.len();
    frame.resize(start + remaining, 0);
    stream.read_exact(&mut frame[start..]).await?;

    Ok(CommandResponse::decode(&frame)?)
}
