//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// 48-bit MAC address (IEEE EUI-48 format).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct MacAddr([u8; 6]);

/// Error type for MAC address parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseMacAddrError {
    // Fewer than six bytes available.
    TooShort(usize),
    InvalidFormat(String),
}

// ===== impl MacAddr =====

impl MacAddr {
    pub const LENGTH: usize = 6;

    pub fn as_bytes(&self) -> [u8; 6] {
        self.0
    }

    // Builds an address out of the first six bytes of a buffer. Backends
    // commonly report hardware addresses in larger, zero-padded buffers.
    pub fn from_slice(bytes: &[u8]) -> Result<MacAddr, ParseMacAddrError> {
        bytes
            .get(..MacAddr::LENGTH)
            .and_then(|bytes| <[u8; 6]>::try_from(bytes).ok())
            .map(MacAddr)
            .ok_or(ParseMacAddrError::TooShort(bytes.len()))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        ))
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    /// Parse a MAC address from a string.
    ///
    /// Accepts formats:
    /// - Colon-separated: "aa:bb:cc:dd:ee:ff"
    /// - Hyphen-separated: "aa-bb-cc-dd-ee-ff"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMacAddrError::InvalidFormat(s.to_owned());
        let separator = if s.contains(':') { ':' } else { '-' };

        let mut bytes = [0u8; 6];
        let mut parts = s.split(separator);
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(MacAddr(bytes))
    }
}

// ===== impl ParseMacAddrError =====

impl std::fmt::Display for ParseMacAddrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseMacAddrError::TooShort(len) => {
                write!(f, "MAC address requires 6 bytes, got {len}")
            }
            ParseMacAddrError::InvalidFormat(s) => {
                write!(f, "invalid MAC address format: {s}")
            }
        }
    }
}

impl std::error::Error for ParseMacAddrError {}

// ===== unit tests =====
