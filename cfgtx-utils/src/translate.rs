//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Conversions between model values and the encodings used by backends.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;

use crate::mac_addr::{MacAddr, ParseMacAddrError};

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    InvalidLength(usize, usize),
    InvalidPrefixLength(u8),
    InvalidFlag(u8),
    InvalidIfIndex(u32),
    MacAddr(ParseMacAddrError),
}

// ===== global functions =====

pub fn ipv4_to_bytes(addr: Ipv4Addr) -> [u8; 4] {
    addr.octets()
}

pub fn ipv4_from_bytes(bytes: &[u8]) -> Result<Ipv4Addr, Error> {
    let octets = <[u8; 4]>::try_from(bytes)
        .map_err(|_| Error::InvalidLength(4, bytes.len()))?;
    Ok(Ipv4Addr::from(octets))
}

pub fn ipv6_to_bytes(addr: Ipv6Addr) -> [u8; 16] {
    addr.octets()
}

pub fn ipv6_from_bytes(bytes: &[u8]) -> Result<Ipv6Addr, Error> {
    let octets = <[u8; 16]>::try_from(bytes)
        .map_err(|_| Error::InvalidLength(16, bytes.len()))?;
    Ok(Ipv6Addr::from(octets))
}

pub fn ip_to_bytes(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(addr) => ipv4_to_bytes(addr).to_vec(),
        IpAddr::V6(addr) => ipv6_to_bytes(addr).to_vec(),
    }
}

// Address family is given by the buffer length.
pub fn ip_from_bytes(bytes: &[u8]) -> Result<IpAddr, Error> {
    match bytes.len() {
        16 => ipv6_from_bytes(bytes).map(IpAddr::V6),
        _ => ipv4_from_bytes(bytes).map(IpAddr::V4),
    }
}

pub fn prefix_to_bytes(prefix: IpNetwork) -> (Vec<u8>, u8) {
    (ip_to_bytes(prefix.ip()), prefix.prefix())
}

pub fn prefix_from_bytes(bytes: &[u8], len: u8) -> Result<IpNetwork, Error> {
    let addr = ip_from_bytes(bytes)?;
    IpNetwork::new(addr, len).map_err(|_| Error::InvalidPrefixLength(len))
}

pub fn mac_to_bytes(addr: &MacAddr) -> [u8; 6] {
    addr.as_bytes()
}

pub fn mac_from_bytes(bytes: &[u8]) -> Result<MacAddr, Error> {
    MacAddr::from_slice(bytes).map_err(Error::MacAddr)
}

// Formats the first six bytes of a hardware address buffer as
// "aa:bb:cc:dd:ee:ff".
pub fn mac_to_string(bytes: &[u8]) -> Result<String, Error> {
    mac_from_bytes(bytes).map(|addr| addr.to_string())
}

pub fn mac_from_str(s: &str) -> Result<MacAddr, Error> {
    s.parse().map_err(Error::MacAddr)
}

pub fn bool_to_byte(value: bool) -> u8 {
    value as u8
}

pub fn byte_to_bool(value: u8) -> Result<bool, Error> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(Error::InvalidFlag(value)),
    }
}

// Model interface indexes are 1-based; backend ones start at zero.
pub fn if_index_to_model(backend_index: u32) -> Result<u32, Error> {
    backend_index
        .checked_add(1)
        .ok_or(Error::InvalidIfIndex(backend_index))
}

pub fn if_index_to_backend(model_index: u32) -> Result<u32, Error> {
    model_index
        .checked_sub(1)
        .ok_or(Error::InvalidIfIndex(model_index))
}

pub fn link_speed_to_bps(kbps: u32) -> u64 {
    u64::from(kbps) * 1000
}

// ===== impl Error =====

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidLength(expected, len) => {
                write!(f, "expected {expected} bytes, got {len}")
            }
            Error::InvalidPrefixLength(len) => {
                write!(f, "invalid prefix length: {len}")
            }
            Error::InvalidFlag(value) => {
                write!(f, "0 or 1 was expected but was {value}")
            }
            Error::InvalidIfIndex(index) => {
                write!(f, "if-index has invalid value {index}")
            }
            Error::MacAddr(..) => {
                write!(f, "invalid hardware address")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MacAddr(error) => Some(error),
            _ => None,
        }
    }
}

// ===== unit tests =====
