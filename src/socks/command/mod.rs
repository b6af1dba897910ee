//! Command request and response messages
//!
//! Both share one frame layout and differ only in how the second byte is
//! interpreted:
//!
//! ```text
//! +----+------------+-------+------+----------+----------+
//! |VER | CMD/STATUS |  RSV  | ATYP |   ADDR   |   PORT   |
//! +----+------------+-------+------+----------+----------+
//! | 1  |     1      | X'00' |  1   | Variable |    2     |
//! +----+------------+-------+------+----------+----------+
//! ```

mod request;
mod response;

pub use request::CommandRequest;
pub use response::{read_command_response, CommandResponse};

use super::address::AddressSpec;
use super::consts::*;
use crate::error::ProtocolError;

/// Check length, version and reserved byte of a frame
fn check_frame(buf: &[u8]) -> Result<(), ProtocolError> {
    if buf.len() < MIN_COMMAND_LEN {
        return Err(ProtocolError::MalformedMessage);
    }
    check_prefix(buf)
}

/// Version and reserved byte only; callers guarantee at least 3 bytes
fn check_prefix(buf: &[u8]) -> Result<(), ProtocolError> {
    if buf[0] != SOCKS5_VERSION {
        return Err(ProtocolError::MismatchedSocksVersion(buf[0]));
    }
    if buf[2] != SOCKS5_RESERVED {
        return Err(ProtocolError::InvalidReservedField(buf[2] as u16));
    }
    Ok(())
}

/// Decode ATYP, address and port starting at byte 3
fn decode_endpoint(buf: &[u8]) -> Result<(AddressSpec, u16), ProtocolError> {
    let (addr, used) = AddressSpec::decode(&buf[4..], buf[3])?;
    let port_at = 4 + used;
    let port = buf
        .get(port_at..port_at + 2)
        .map(|p| u16::from_be_bytes([p[0], p[1]]))
        .ok_or(ProtocolError::MalformedMessage)?;
    Ok((addr, port))
}

/// Build a frame; anything under the minimum frame length is refused since
/// it would not decode again (domains of one or two bytes)
fn encode_frame(code: u8, addr: &AddressSpec, port: u16) -> Result<Vec<u8>, ProtocolError> {
    if 6 + addr.encoded_len() < MIN_COMMAND_LEN {
        return Err(ProtocolError::MalformedMessage);
    }
    let mut buf = Vec::with_capacity(6 + addr.encoded_len());
    buf.push(SOCKS5_VERSION);
    buf.push(code);
    buf.push(SOCKS5_RESERVED);
    buf.push(addr.kind().to_byte());
    addr.encode_into(&mut buf)?;
    buf.extend_from_slice(&port.to_be_bytes());
    Ok(buf)
}
