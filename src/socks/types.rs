//! SOCKS5 type definitions
//!
//! Byte-level enums for the discriminants carried by every message.

use super::consts::*;
use crate::error::ProtocolError;
use std::fmt;

/// Address family discriminant (ATYP)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Four raw bytes
    Ipv4,
    /// Length-prefixed name
    DomainName,
    /// Sixteen raw bytes
    Ipv6,
}

impl AddressType {
    /// Convert to the wire value
    pub fn to_byte(self) -> u8 {
        match self {
            AddressType::Ipv4 => SOCKS5_ADDR_TYPE_IPV4,
            AddressType::DomainName => SOCKS5_ADDR_TYPE_DOMAIN,
            AddressType::Ipv6 => SOCKS5_ADDR_TYPE_IPV6,
        }
    }
}

impl TryFrom<u8> for AddressType {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            SOCKS5_ADDR_TYPE_IPV4 => Ok(AddressType::Ipv4),
            SOCKS5_ADDR_TYPE_DOMAIN => Ok(AddressType::DomainName),
            SOCKS5_ADDR_TYPE_IPV6 => Ok(AddressType::Ipv6),
            other => Err(ProtocolError::InvalidAddressType(other)),
        }
    }
}

/// Authentication method identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// No authentication required
    NoAuth,
    /// GSSAPI
    Gssapi,
    /// Username/password
    UsernamePassword,
    /// Challenge-Handshake Authentication Protocol
    Chap,
    /// Challenge-Response Authentication Method
    Cram,
    /// Secure Sockets Layer
    Ssl,
    /// NDS authentication
    Nds,
    /// Multi-Authentication Framework
    Maf,
    /// JSON parameter block
    JsonParameterBlock,
    /// Server found nothing acceptable in the offer
    NoAcceptableMethods,
}

impl AuthMethod {
    /// Convert to the wire value
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::NoAuth => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Gssapi => SOCKS5_AUTH_METHOD_GSSAPI,
            AuthMethod::UsernamePassword => SOCKS5_AUTH_METHOD_PASSWORD,
            AuthMethod::Chap => SOCKS5_AUTH_METHOD_CHAP,
            AuthMethod::Cram => SOCKS5_AUTH_METHOD_CRAM,
            AuthMethod::Ssl => SOCKS5_AUTH_METHOD_SSL,
            AuthMethod::Nds => SOCKS5_AUTH_METHOD_NDS,
            AuthMethod::Maf => SOCKS5_AUTH_METHOD_MAF,
            AuthMethod::JsonParameterBlock => SOCKS5_AUTH_METHOD_JSON,
            AuthMethod::NoAcceptableMethods => SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE,
        }
    }
}

impl TryFrom<u8> for AuthMethod {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Ok(AuthMethod::NoAuth),
            SOCKS5_AUTH_METHOD_GSSAPI => Ok(AuthMethod::Gssapi),
            SOCKS5_AUTH_METHOD_PASSWORD => Ok(AuthMethod::UsernamePassword),
            SOCKS5_AUTH_METHOD_CHAP => Ok(AuthMethod::Chap),
            SOCKS5_AUTH_METHOD_CRAM => Ok(AuthMethod::Cram),
            SOCKS5_AUTH_METHOD_SSL => Ok(AuthMethod::Ssl),
            SOCKS5_AUTH_METHOD_NDS => Ok(AuthMethod::Nds),
            SOCKS5_AUTH_METHOD_MAF => Ok(AuthMethod::Maf),
            SOCKS5_AUTH_METHOD_JSON => Ok(AuthMethod::JsonParameterBlock),
            SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE => Ok(AuthMethod::NoAcceptableMethods),
            other => Err(ProtocolError::UnknownAuthMethod(other)),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthMethod::NoAuth => "no authentication",
            AuthMethod::Gssapi => "GSSAPI",
            AuthMethod::UsernamePassword => "username/password",
            AuthMethod::Chap => "CHAP",
            AuthMethod::Cram => "CRAM",
            AuthMethod::Ssl => "SSL",
            AuthMethod::Nds => "NDS",
            AuthMethod::Maf => "MAF",
            AuthMethod::JsonParameterBlock => "JSON parameter block",
            AuthMethod::NoAcceptableMethods => "no acceptable methods",
        };
        write!(f, "{}", name)
    }
}

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - accept one inbound connection on behalf of the client
    Bind,
    /// UDP ASSOCIATE - establish UDP relay
    UdpAssociate,
}

impl SocksCommand {
    /// Convert SocksCommand to byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
        }
    }
}

impl TryFrom<u8> for SocksCommand {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Ok(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Ok(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Ok(SocksCommand::UdpAssociate),
            other => Err(ProtocolError::InvalidCommand(other)),
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Reply status carried in a command response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Succeeded
    Success,
    /// General SOCKS server failure
    ServerFailure,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed,
    /// Network unreachable
    NetworkUnreachable,
    /// Host unreachable
    HostUnreachable,
    /// Connection refused
    ConnectionRefused,
    /// TTL expired
    TtlExpired,
    /// Command not supported
    CommandNotSupported,
    /// Address type not supported
    AddressTypeNotSupported,
    /// Reserved value 0x09
    Unassigned,
}

impl StatusCode {
    /// Convert to the wire value
    pub fn to_byte(self) -> u8 {
        match self {
            StatusCode::Success => SOCKS5_REPLY_SUCCEEDED,
            StatusCode::ServerFailure => SOCKS5_REPLY_GENERAL_FAILURE,
            StatusCode::ConnectionNotAllowed => SOCKS5_REPLY_CONNECTION_NOT_ALLOWED,
            StatusCode::NetworkUnreachable => SOCKS5_REPLY_NETWORK_UNREACHABLE,
            StatusCode::HostUnreachable => SOCKS5_REPLY_HOST_UNREACHABLE,
            StatusCode::ConnectionRefused => SOCKS5_REPLY_CONNECTION_REFUSED,
            StatusCode::TtlExpired => SOCKS5_REPLY_TTL_EXPIRED,
            StatusCode::CommandNotSupported => SOCKS5_REPLY_COMMAND_NOT_SUPPORTED,
            StatusCode::AddressTypeNotSupported => SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED,
            StatusCode::Unassigned => SOCKS5_REPLY_UNASSIGNED,
        }
    }

    /// Check whether this is the success status
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            SOCKS5_REPLY_SUCCEEDED => Ok(StatusCode::Success),
            SOCKS5_REPLY_GENERAL_FAILURE => Ok(StatusCode::ServerFailure),
            SOCKS5_REPLY_CONNECTION_NOT_ALLOWED => Ok(StatusCode::ConnectionNotAllowed),
            SOCKS5_REPLY_NETWORK_UNREACHABLE => Ok(StatusCode::NetworkUnreachable),
            SOCKS5_REPLY_HOST_UNREACHABLE => Ok(StatusCode::HostUnreachable),
            SOCKS5_REPLY_CONNECTION_REFUSED => Ok(StatusCode::ConnectionRefused),
            SOCKS5_REPLY_TTL_EXPIRED => Ok(StatusCode::TtlExpired),
            SOCKS5_REPLY_COMMAND_NOT_SUPPORTED => Ok(StatusCode::CommandNotSupported),
            SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED => Ok(StatusCode::AddressTypeNotSupported),
            SOCKS5_REPLY_UNASSIGNED => Ok(StatusCode::Unassigned),
            other => Err(ProtocolError::InvalidStatus(other)),
        }
    }
}
