//! SOCKS5 protocol constants
//!
//! Wire values shared by every message codec.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods (IANA catalog)
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// GSSAPI
pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
/// Username/password
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// Challenge-Handshake Authentication Protocol
pub const SOCKS5_AUTH_METHOD_CHAP: u8 = 0x03;
/// Unassigned, never valid on the wire
pub const SOCKS5_AUTH_METHOD_UNASSIGNED: u8 = 0x04;
/// Challenge-Response Authentication Method
pub const SOCKS5_AUTH_METHOD_CRAM: u8 = 0x05;
/// Secure Sockets Layer
pub const SOCKS5_AUTH_METHOD_SSL: u8 = 0x06;
/// NDS authentication
pub const SOCKS5_AUTH_METHOD_NDS: u8 = 0x07;
/// Multi-Authentication Framework
pub const SOCKS5_AUTH_METHOD_MAF: u8 = 0x08;
/// JSON parameter block
pub const SOCKS5_AUTH_METHOD_JSON: u8 = 0x09;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

// Reply codes
/// Succeeded
pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;
/// General SOCKS server failure
pub const SOCKS5_REPLY_GENERAL_FAILURE: u8 = 0x01;
/// Connection not allowed by ruleset
pub const SOCKS5_REPLY_CONNECTION_NOT_ALLOWED: u8 = 0x02;
/// Network unreachable
pub const SOCKS5_REPLY_NETWORK_UNREACHABLE: u8 = 0x03;
/// Host unreachable
pub const SOCKS5_REPLY_HOST_UNREACHABLE: u8 = 0x04;
/// Connection refused
pub const SOCKS5_REPLY_CONNECTION_REFUSED: u8 = 0x05;
/// TTL expired
pub const SOCKS5_REPLY_TTL_EXPIRED: u8 = 0x06;
/// Command not supported
pub const SOCKS5_REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
/// Address type not supported
pub const SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED: u8 = 0x08;
/// Unassigned; accepted by decoders, never sent
pub const SOCKS5_REPLY_UNASSIGNED: u8 = 0x09;

// Reserved byte
/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Sizes
/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;
/// Shortest possible command request/response or UDP datagram
pub const MIN_COMMAND_LEN: usize = 10;
/// Read buffer for handshake messages on the server side
pub const HANDSHAKE_BUFFER_SIZE: usize = 1024;
/// Largest UDP datagram the relay will receive
pub const UDP_BUFFER_SIZE: usize = 65535;
