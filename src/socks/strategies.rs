//! Generators for the wire types, shared by the codec property tests

use super::address::AddressSpec;
use super::types::{AuthMethod, SocksCommand, StatusCode};
use proptest::prelude::*;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Any address the public constructors can build
pub(crate) fn address() -> impl Strategy<Value = AddressSpec> {
    prop_oneof![
        any::<Ipv4Addr>().prop_map(AddressSpec::ipv4),
        any::<Ipv6Addr>().prop_map(AddressSpec::ipv6),
        "[a-z0-9.-]{0,255}".prop_map(|name| AddressSpec::domain(&name).unwrap()),
        // Multi-byte names, at most 4 bytes per char
        "\\PC{0,63}".prop_map(|name| AddressSpec::domain(&name).unwrap()),
    ]
}

pub(crate) fn command() -> impl Strategy<Value = SocksCommand> {
    prop_oneof![
        Just(SocksCommand::Connect),
        Just(SocksCommand::Bind),
        Just(SocksCommand::UdpAssociate),
    ]
}

/// Every status a decoder accepts, including the unassigned 9
pub(crate) fn status() -> impl Strategy<Value = StatusCode> {
    (0u8..=9).prop_map(|b| StatusCode::try_from(b).unwrap())
}

/// Methods a client may offer: 0 to 9 without the unassigned 4
pub(crate) fn offered_method() -> impl Strategy<Value = AuthMethod> {
    (0u8..=9)
        .prop_filter("unassigned", |b| *b != 4)
        .prop_map(|b| AuthMethod::try_from(b).unwrap())
}

/// Methods a server may answer with, 255 included
pub(crate) fn accepted_method() -> impl Strategy<Value = AuthMethod> {
    prop_oneof![offered_method(), Just(AuthMethod::NoAcceptableMethods)]
}
