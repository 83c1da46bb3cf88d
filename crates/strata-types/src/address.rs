use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Content address of any versioned entity (object, tree node, commit).
///
/// An `Address` is the 32-byte digest of an entity's canonical serialization.
/// Identical content always produces the same `Address`, so immutable
/// entities deduplicate and subtrees are shared structurally.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Wrap a pre-computed 32-byte digest.
    pub const fn from_raw(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, IndexError> {
        let bytes = hex::decode(s)
            .map_err(|e| IndexError::Serialization(format!("invalid hex address: {e}")))?;
        if bytes.len() != 32 {
            return Err(IndexError::Serialization(format!(
                "invalid address length: expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes);
        Ok(Self(digest))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Address {
    fn from(digest: [u8; 32]) -> Self {
        Self(digest)
    }
}

impl From<Address> for [u8; 32] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let addr = Address::from_raw([0xab; 32]);
        let hex = addr.to_hex();
        assert_eq!(hex.len(), 64);
        let parsed = Address::from_hex(&hex).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn from_hex_rejects_bad_length() {
        let err = Address::from_hex("abcd").unwrap_err();
        assert!(matches!(err, IndexError::Serialization(_)));
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(Address::from_hex("zz").is_err());
    }

    #[test]
    fn short_hex_is_8_chars() {
        let addr = Address::from_raw([0x12; 32]);
        assert_eq!(addr.short_hex(), "12121212");
    }

    #[test]
    fn display_is_full_hex() {
        let addr = Address::from_raw([7; 32]);
        assert_eq!(format!("{addr}"), addr.to_hex());
    }

    #[test]
    fn ordering_is_consistent() {
        let a = Address::from_raw([0; 32]);
        let b = Address::from_raw([1; 32]);
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let addr = Address::from_raw([0x42; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, parsed);
    }
}
