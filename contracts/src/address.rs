//! # Account Addresses
//!
//! Every participant in the bank is identified by a 20-byte address supplied
//! by the caller identity provider. The bank never derives, signs, or
//! verifies addresses; it only compares them. What matters here is a
//! canonical text form so that the same account is never recorded twice
//! under two spellings:
//!
//! ```text
//! 0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266   (checksummed, as wallets print it)
//! f39fd6e51aad88f6f4ce6ab8827279cfffb92266     (bare hex)
//!     -> Address([0xf3, 0x9f, ...])
//!     -> "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, ADDRESS_PREFIX};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string contains characters outside `[0-9a-fA-F]`.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// The decoded bytes have the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required number of bytes.
        expected: usize,
        /// Number of bytes actually decoded.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address.
///
/// Cheap to copy, hashable and ordered, so it can key both `HashMap`s and
/// the sorted views used in snapshots.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Never a valid owner in practice, but handy as a
    /// sentinel in tests.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Parses a hex address, with or without the `0x` prefix. Case is
    /// ignored, so EIP-55 checksummed input is accepted (but the checksum is
    /// not validated).
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(ADDRESS_PREFIX)
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            });
        }

        let mut raw = [0u8; ADDRESS_LENGTH];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }

    /// Deterministic address derived from a small index. Used to fabricate
    /// distinct accounts in tests and simulations.
    pub fn from_index(index: u64) -> Self {
        let mut raw = [0u8; ADDRESS_LENGTH];
        raw[ADDRESS_LENGTH - 8..].copy_from_slice(&index.to_be_bytes());
        Self(raw)
    }

    /// Canonical `0x`-prefixed lowercase hex form.
    pub fn to_hex(&self) -> String {
        format!("{}{}", ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::parse(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            if bytes.len() != ADDRESS_LENGTH {
                return Err(serde::de::Error::custom(AddressError::InvalidLength {
                    expected: ADDRESS_LENGTH,
                    got: bytes.len(),
                }));
            }
            let mut raw = [0u8; ADDRESS_LENGTH];
            raw.copy_from_slice(&bytes);
            Ok(Address(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_checksummed_and_bare_forms_agree() {
        let a = Address::parse("0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        let b = Address::parse("f39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Address::parse("0xdeadbeef").unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidLength {
                expected: 20,
                got: 4
            }
        );
    }

    #[test]
    fn parse_rejects_non_hex() {
        let result = Address::parse("0xzz9fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert!(matches!(result, Err(AddressError::InvalidHex(_))));
    }

    #[test]
    fn from_index_is_distinct() {
        assert_ne!(Address::from_index(1), Address::from_index(2));
        assert_eq!(Address::from_index(0), Address::ZERO);
    }

    #[test]
    fn json_uses_hex_string() {
        let a = Address::from_index(0xabcd);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"0x000000000000000000000000000000000000abcd\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
