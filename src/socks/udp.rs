//! UDP datagram encapsulation
//!
//! ```text
//! +----+------+------+----------+----------+----------+
//! |RSV | FRAG | ATYP | DST.ADDR | DST.PORT |   DATA   |
//! +----+------+------+----------+----------+----------+
//! | 2  |  1   |  1   | Variable |    2     | Variable |
//! +----+------+------+----------+----------+----------+
//! ```

use super::address::AddressSpec;
use super::consts::MIN_COMMAND_LEN;
use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};

/// One encapsulated datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    /// Fragment number (0 for standalone packets)
    pub fragment: u8,
    /// Destination (client to relay) or source (relay to client) address
    pub destination: AddressSpec,
    /// Destination or source port
    pub port: u16,
    /// Application payload, possibly empty
    pub payload: Bytes,
}

impl UdpDatagram {
    /// Create an unfragmented datagram
    pub fn new(destination: AddressSpec, port: u16, payload: impl Into<Bytes>) -> Self {
        UdpDatagram {
            fragment: 0,
            destination,
            port,
            payload: payload.into(),
        }
    }

    /// Encode to wire format
    ///
    /// A datagram shorter than the 10-byte minimum (a one or two byte
    /// domain with a short payload) is refused.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let len = 6 + self.destination.encoded_len() + self.payload.len();
        if len < MIN_COMMAND_LEN {
            return Err(ProtocolError::MalformedMessage);
        }
        let mut buf = BytesMut::with_capacity(len);
        buf.put_u16(0);
        buf.put_u8(self.fragment);
        buf.put_u8(self.destination.kind().to_byte());
        self.destination.encode_into(&mut buf)?;
        buf.put_u16(self.port);
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }

    /// Decode from wire format
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < MIN_COMMAND_LEN {
            return Err(ProtocolError::MalformedMessage);
        }

        let reserved = u16::from_be_bytes([buf[0], buf[1]]);
        if reserved != 0 {
            return Err(ProtocolError::InvalidReservedField(reserved));
        }

        let fragment = buf[2];
        let (destination, used) = AddressSpec::decode(&buf[4..], buf[3])?;

        let port_at = 4 + used;
        let port = buf
            .get(port_at..port_at + 2)
            .map(|p| u16::from_be_bytes([p[0], p[1]]))
            .ok_or(ProtocolError::MalformedMessage)?;

        Ok(UdpDatagram {
            fragment,
            destination,
            port,
            payload: Bytes::copy_from_slice(&buf[port_at + 2..]),
        })
    }
}
