//! Method negotiation messages
//!
//! The client opens with an offer listing the methods it supports, the
//! server answers with the one it picked.
//!
//! ```text
//! offer:   +----+----------+----------+
//!          |VER | NMETHODS | METHODS  |
//!          +----+----------+----------+
//!          | 1  |    1     | 1 to 255 |
//!          +----+----------+----------+
//!
//! accept:  +----+--------+
//!          |VER | METHOD |
//!          +----+--------+
//!          | 1  |   1    |
//!          +----+--------+
//! ```

use super::consts::SOCKS5_VERSION;
use super::types::AuthMethod;
use crate::error::ProtocolError;

/// Methods offered by a client, in preference order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthMethodsOffer {
    methods: Vec<AuthMethod>,
}

impl AuthMethodsOffer {
    /// Empty offer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one method; duplicates are kept
    pub fn add(&mut self, method: AuthMethod) -> Result<(), ProtocolError> {
        if method == AuthMethod::NoAcceptableMethods {
            return Err(ProtocolError::UnknownAuthMethod(method.to_byte()));
        }
        self.methods.push(method);
        Ok(())
    }

    /// Append several methods, stopping at the first invalid one
    pub fn add_all(&mut self, methods: &[AuthMethod]) -> Result<(), ProtocolError> {
        methods.iter().try_for_each(|m| self.add(*m))
    }

    /// Offered methods
    pub fn methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    /// Check whether `method` was offered
    pub fn contains(&self, method: AuthMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Encode to wire format; the offer must hold 1 to 255 methods
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.methods.is_empty() || self.methods.len() > u8::MAX as usize {
            return Err(ProtocolError::MalformedMessage);
        }
        let mut buf = Vec::with_capacity(2 + self.methods.len());
        buf.push(SOCKS5_VERSION);
        buf.push(self.methods.len() as u8);
        buf.extend(self.methods.iter().map(|m| m.to_byte()));
        Ok(buf)
    }

    /// Decode from wire format
    ///
    /// Bytes past the declared method count are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < 3 {
            return Err(ProtocolError::MalformedMessage);
        }
        if buf[0] != SOCKS5_VERSION {
            return Err(ProtocolError::MismatchedSocksVersion(buf[0]));
        }

        let count = buf[1] as usize;
        let ids = buf
            .get(2..2 + count)
            .ok_or(ProtocolError::MalformedMessage)?;

        let mut offer = AuthMethodsOffer::new();
        for id in ids {
            offer.add(AuthMethod::try_from(*id)?)?;
        }
        Ok(offer)
    }
}

/// Method chosen by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthMethodAccept {
    method: AuthMethod,
}

impl AuthMethodAccept {
    /// Accept `method`
    pub fn new(method: AuthMethod) -> Self {
        AuthMethodAccept { method }
    }

    /// Chosen method
    pub fn method(&self) -> AuthMethod {
        self.method
    }

    /// Encode to wire format
    pub fn encode(&self) -> [u8; 2] {
        [SOCKS5_VERSION, self.method.to_byte()]
    }

    /// Decode from wire format
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < 2 {
            return Err(ProtocolError::MalformedMessage);
        }
        if buf[0] != SOCKS5_VERSION {
            return Err(ProtocolError::MismatchedSocksVersion(buf[0]));
        }
        Ok(AuthMethodAccept {
            method: AuthMethod::try_from(buf[1])?,
        })
    }
}

/// Pick the method the server answers an offer with
///
/// Only "no authentication" is ever selected.
pub fn select_method(offer: &AuthMethodsOffer) -> AuthMethod {
    if offer.contains(AuthMethod::NoAuth) {
        AuthMethod::NoAuth
    } else {
        AuthMethod::NoAcceptableMethods
    }
}
