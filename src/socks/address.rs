//! Destination/bound address codec
//!
//! Every request, response and UDP datagram carries an address whose layout
//! depends on the ATYP byte in front of it:
//!
//! ```text
//! ATYP 0x01 (IPv4)    +----+----+----+----+
//!                     | a  | b  | c  | d  |
//!                     +----+----+----+----+
//!
//! ATYP 0x03 (domain)  +-----+---------------+
//!                     | LEN | LEN name bytes |
//!                     +-----+---------------+
//!
//! ATYP 0x04 (IPv6)    +--------------------+
//!                     | 16 raw bytes       |
//!                     +--------------------+
//! ```
//!
//! IP addresses are held as text in a canonical form: dotted decimal for
//! IPv4 and eight zero-padded lowercase hex groups for IPv6 (no `::`
//! compression), which is exactly what decoding produces.

use super::consts::MAX_DOMAIN_LEN;
use super::types::AddressType;
use crate::error::{ProtocolError, Result, SocksError};
use bytes::BufMut;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// An address together with its ATYP
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressSpec {
    kind: AddressType,
    value: String,
}

impl AddressSpec {
    /// Build an address of the given kind from text, canonicalising IP forms
    pub fn new(kind: AddressType, value: &str) -> std::result::Result<Self, ProtocolError> {
        match kind {
            AddressType::Ipv4 => value
                .parse::<Ipv4Addr>()
                .map(Self::ipv4)
                .map_err(|_| ProtocolError::InvalidAddress(value.to_string())),
            AddressType::Ipv6 => value
                .parse::<Ipv6Addr>()
                .map(Self::ipv6)
                .map_err(|_| ProtocolError::InvalidAddress(value.to_string())),
            AddressType::DomainName => Self::domain(value),
        }
    }

    /// Infer the kind from text: IP literals keep their family, anything
    /// else is treated as a domain name.
    pub fn parse(value: &str) -> std::result::Result<Self, ProtocolError> {
        match value.parse::<IpAddr>() {
            Ok(ip) => Ok(ip.into()),
            Err(_) => Self::domain(value),
        }
    }

    /// IPv4 address
    pub fn ipv4(ip: Ipv4Addr) -> Self {
        AddressSpec {
            kind: AddressType::Ipv4,
            value: ip.to_string(),
        }
    }

    /// IPv6 address in expanded form
    pub fn ipv6(ip: Ipv6Addr) -> Self {
        let value = ip
            .segments()
            .iter()
            .map(|group| format!("{:04x}", group))
            .collect::<Vec<_>>()
            .join(":");
        AddressSpec {
            kind: AddressType::Ipv6,
            value,
        }
    }

    /// Domain name of at most 255 bytes
    pub fn domain(name: &str) -> std::result::Result<Self, ProtocolError> {
        if name.len() > MAX_DOMAIN_LEN {
            return Err(ProtocolError::InvalidAddress(format!(
                "domain name is {} bytes long",
                name.len()
            )));
        }
        Ok(AddressSpec {
            kind: AddressType::DomainName,
            value: name.to_string(),
        })
    }

    /// `0.0.0.0`, used as the placeholder bound address
    pub fn unspecified() -> Self {
        Self::ipv4(Ipv4Addr::UNSPECIFIED)
    }

    /// Address family
    pub fn kind(&self) -> AddressType {
        self.kind
    }

    /// Textual value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parsed IP, `None` for domain names
    pub fn ip(&self) -> Option<IpAddr> {
        match self.kind {
            AddressType::DomainName => None,
            _ => self.value.parse().ok(),
        }
    }

    /// Encoded length on the wire, excluding ATYP
    pub fn encoded_len(&self) -> usize {
        match self.kind {
            AddressType::Ipv4 => 4,
            AddressType::Ipv6 => 16,
            AddressType::DomainName => 1 + self.value.len(),
        }
    }

    /// Append the address bytes (without ATYP) to `buf`
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) -> std::result::Result<(), ProtocolError> {
        match self.kind {
            AddressType::Ipv4 => {
                let ip: Ipv4Addr = self
                    .value
                    .parse()
                    .map_err(|_| ProtocolError::InvalidAddress(self.value.clone()))?;
                buf.put_slice(&ip.octets());
            }
            AddressType::Ipv6 => {
                let ip: Ipv6Addr = self
                    .value
                    .parse()
                    .map_err(|_| ProtocolError::InvalidAddress(self.value.clone()))?;
                buf.put_slice(&ip.octets());
            }
            AddressType::DomainName => {
                let name = self.value.as_bytes();
                if name.len() > MAX_DOMAIN_LEN {
                    return Err(ProtocolError::InvalidAddress(self.value.clone()));
                }
                buf.put_u8(name.len() as u8);
                buf.put_slice(name);
            }
        }
        Ok(())
    }

    /// Encode the address bytes (without ATYP)
    pub fn encode(&self) -> std::result::Result<Vec<u8>, ProtocolError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decode an address of type `atyp` from the start of `buf`
    ///
    /// Returns the address and the number of bytes consumed so the caller
    /// can find the port field that follows.
    pub fn decode(buf: &[u8], atyp: u8) -> std::result::Result<(Self, usize), ProtocolError> {
        match AddressType::try_from(atyp)? {
            AddressType::Ipv4 => {
                let octets: [u8; 4] = buf
                    .get(..4)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(ProtocolError::MalformedMessage)?;
                Ok((Self::ipv4(Ipv4Addr::from(octets)), 4))
            }
            AddressType::Ipv6 => {
                let octets: [u8; 16] = buf
                    .get(..16)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(ProtocolError::MalformedMessage)?;
                Ok((Self::ipv6(Ipv6Addr::from(octets)), 16))
            }
            AddressType::DomainName => {
                let len = *buf.first().ok_or(ProtocolError::MalformedMessage)? as usize;
                let name = buf
                    .get(1..1 + len)
                    .ok_or(ProtocolError::MalformedMessage)?;
                // Names are kept as text, so bytes that are not UTF-8 can't be carried
                let name =
                    std::str::from_utf8(name).map_err(|_| ProtocolError::MalformedMessage)?;
                let spec = AddressSpec {
                    kind: AddressType::DomainName,
                    value: name.to_string(),
                };
                Ok((spec, 1 + len))
            }
        }
    }

    /// Resolve to a socket address, looking domain names up with the runtime resolver
    pub async fn resolve(&self, port: u16) -> Result<SocketAddr> {
        if let Some(ip) = self.ip() {
            return Ok(SocketAddr::new(ip, port));
        }
        if self.kind != AddressType::DomainName {
            return Err(ProtocolError::InvalidAddress(self.value.clone()).into());
        }

        tokio::net::lookup_host((self.value.as_str(), port))
            .await
            .map_err(|e| SocksError::Resolve(format!("{}: {}", self.value, e)))?
            .next()
            .ok_or_else(|| SocksError::Resolve(format!("no addresses found for {}", self.value)))
    }
}

impl From<IpAddr> for AddressSpec {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => AddressSpec::ipv4(v4),
            IpAddr::V6(v6) => AddressSpec::ipv6(v6),
        }
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::strategies;
    use proptest::collection::vec;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_round_trip_any_address(addr in strategies::address()) {
            let encoded = addr.encode().unwrap();
            prop_assert_eq!(encoded.len(), addr.encoded_len());

            let (decoded, used) = AddressSpec::decode(&encoded, addr.kind().to_byte()).unwrap();
            prop_assert_eq!(used, encoded.len());
            prop_assert_eq!(decoded, addr);
        }

        #[test]
        fn test_decode_arbitrary_bytes(atyp in any::<u8>(), buf in vec(any::<u8>(), 0..300)) {
            if let Ok((addr, used)) = AddressSpec::decode(&buf, atyp) {
                prop_assert!(used <= buf.len());
                prop_assert_eq!(addr.encoded_len(), used);
                prop_assert_eq!(addr.encode().unwrap(), buf[..used].to_vec());
            }
        }
    }

    #[test]
    fn test_decode_ipv4() {
        let (addr, used) = AddressSpec::decode(&[0x7F, 0x00, 0x00, 0x01], 1).unwrap();
        assert_eq!(addr.kind(), AddressType::Ipv4);
        assert_eq!(addr.value(), "127.0.0.1");
        assert_eq!(used, 4);
    }

    #[test]
    fn test_decode_ipv6_is_expanded() {
        let mut raw = [0u8; 16];
        raw[15] = 1;
        let (addr, used) = AddressSpec::decode(&raw, 4).unwrap();
        assert_eq!(addr.kind(), AddressType::Ipv6);
        assert_eq!(addr.value(), "0000:0000:0000:0000:0000:0000:0000:0001");
        assert_eq!(used, 16);
    }

    #[test]
    fn test_decode_domain() {
        let mut raw = vec![0x0B];
        raw.extend_from_slice(b"ifconfig.me");
        raw.extend_from_slice(&[0x00, 0x50]);
        let (addr, used) = AddressSpec::decode(&raw, 3).unwrap();
        assert_eq!(addr.kind(), AddressType::DomainName);
        assert_eq!(addr.value(), "ifconfig.me");
        assert_eq!(used, 12);
    }

    #[test]
    fn test_decode_invalid_type() {
        for atyp in [0u8, 2, 5, 255] {
            assert_eq!(
                AddressSpec::decode(&[0; 16], atyp),
                Err(ProtocolError::InvalidAddressType(atyp))
            );
        }
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            AddressSpec::decode(&[127, 0, 0], 1),
            Err(ProtocolError::MalformedMessage)
        );
        assert_eq!(
            AddressSpec::decode(&[0u8; 15], 4),
            Err(ProtocolError::MalformedMessage)
        );
        assert_eq!(
            AddressSpec::decode(&[5, b'a', b'b'], 3),
            Err(ProtocolError::MalformedMessage)
        );
        assert_eq!(
            AddressSpec::decode(&[], 3),
            Err(ProtocolError::MalformedMessage)
        );
    }

    #[test]
    fn test_decode_domain_rejects_invalid_utf8() {
        let mut raw = vec![200u8];
        raw.extend(std::iter::repeat(0xFF).take(200));
        assert_eq!(
            AddressSpec::decode(&raw, 3),
            Err(ProtocolError::MalformedMessage)
        );

        // A truncated multi-byte sequence is rejected too
        assert_eq!(
            AddressSpec::decode(&[2, b'a', 0xC3], 3),
            Err(ProtocolError::MalformedMessage)
        );
    }

    #[test]
    fn test_decode_domain_keeps_utf8_length() {
        let name = "bücher.example";
        let mut raw = vec![name.len() as u8];
        raw.extend_from_slice(name.as_bytes());
        let (addr, used) = AddressSpec::decode(&raw, 3).unwrap();
        assert_eq!(addr.value(), name);
        assert_eq!(used, 1 + addr.value().len());
        assert_eq!(addr.encode().unwrap(), raw);
    }

    #[test]
    fn test_encode() {
        let addr = AddressSpec::ipv4(Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(addr.encode().unwrap(), vec![192, 168, 1, 1]);

        let addr = AddressSpec::domain("test").unwrap();
        assert_eq!(addr.encode().unwrap(), b"\x04test".to_vec());

        let addr = AddressSpec::ipv6(Ipv6Addr::LOCALHOST);
        let encoded = addr.encode().unwrap();
        assert_eq!(encoded.len(), 16);
        assert_eq!(encoded[15], 1);
    }

    #[test]
    fn test_new_canonicalises_ipv6() {
        let addr = AddressSpec::new(AddressType::Ipv6, "2001:0:130f::9c0:876a:130b").unwrap();
        assert_eq!(addr.value(), "2001:0000:130f:0000:0000:09c0:876a:130b");

        let encoded = addr.encode().unwrap();
        let (decoded, _) = AddressSpec::decode(&encoded, 4).unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn test_new_rejects_mismatched_text() {
        assert!(AddressSpec::new(AddressType::Ipv4, "example.com").is_err());
        assert!(AddressSpec::new(AddressType::Ipv6, "10.0.0.1").is_err());
        assert!(AddressSpec::domain(&"a".repeat(256)).is_err());
        assert!(AddressSpec::domain(&"a".repeat(255)).is_ok());
    }

    #[test]
    fn test_parse_infers_kind() {
        assert_eq!(
            AddressSpec::parse("10.1.2.3").unwrap().kind(),
            AddressType::Ipv4
        );
        assert_eq!(AddressSpec::parse("::1").unwrap().kind(), AddressType::Ipv6);
        assert_eq!(
            AddressSpec::parse("example.com").unwrap().kind(),
            AddressType::DomainName
        );
    }

    #[test]
    fn test_domain_round_trip_max_length() {
        let name = "x".repeat(255);
        let addr = AddressSpec::domain(&name).unwrap();
        let encoded = addr.encode().unwrap();
        assert_eq!(encoded.len(), 256);
        let (decoded, used) = AddressSpec::decode(&encoded, 3).unwrap();
        assert_eq!(decoded, addr);
        assert_eq!(used, 256);
    }

    #[tokio::test]
    async fn test_resolve_ip() {
        let addr = AddressSpec::ipv4(Ipv4Addr::new(127, 0, 0, 1));
        let resolved = addr.resolve(8080).await.unwrap();
        assert_eq!(resolved, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());

        let addr = AddressSpec::ipv6(Ipv6Addr::LOCALHOST);
        let resolved = addr.resolve(53).await.unwrap();
        assert_eq!(resolved, "[::1]:53".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr = AddressSpec::domain("localhost").unwrap();
        let resolved = addr.resolve(80).await.unwrap();
        assert!(resolved.ip().is_loopback());
        assert_eq!(resolved.port(), 80);
    }
}
