//! Document digest type.
//!
//! A [`Digest`] is the 256-bit fingerprint of a document, supplied by the
//! producer. It is the primary key of the registry; the registry itself
//! never computes one.

use serde::{Deserialize, Serialize};

use crate::constants::{DIGEST_HEX_LEN, DIGEST_SIZE};
use crate::error::{AttestorError, Result};

/// A 256-bit document digest.
///
/// Treated as an opaque identifier: the registry does not care which hash
/// function produced it. Parsing accepts the messy forms digests arrive in
/// from copy-paste (surrounding whitespace, quotes, `0x`/`0X` prefix, mixed
/// case) and normalizes to lowercase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    bytes: [u8; DIGEST_SIZE],
}

impl Digest {
    /// The all-zero digest. No digest value is reserved by the registry,
    /// so this is a valid key; it exists for tests and defaults.
    pub const ZERO: Digest = Digest {
        bytes: [0u8; DIGEST_SIZE],
    };

    /// Creates a digest from raw bytes.
    ///
    /// # Errors
    /// Returns an error if `bytes` is not exactly `DIGEST_SIZE` long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DIGEST_SIZE {
            return Err(AttestorError::InvalidDigest(format!(
                "expected {} bytes, got {}",
                DIGEST_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; DIGEST_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a digest from a fixed-size array.
    pub const fn from_array(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses a digest from a hex string, leniently.
    ///
    /// Accepts surrounding whitespace and quotes, embedded whitespace, and
    /// an optional `0x`/`0X` prefix. Requires exactly 64 hex characters
    /// after cleanup.
    pub fn parse(input: &str) -> Result<Self> {
        let mut clean: String = input
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if clean.starts_with("0x") || clean.starts_with("0X") {
            clean = clean[2..].to_string();
        }

        if clean.len() != DIGEST_HEX_LEN {
            return Err(AttestorError::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                DIGEST_HEX_LEN,
                clean.len()
            )));
        }

        let bytes = hex::decode(clean.to_lowercase())
            .map_err(|e| AttestorError::InvalidDigest(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes of the digest.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the digest as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; DIGEST_SIZE] {
        &self.bytes
    }

    /// Returns the `0x`-prefixed lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Returns true if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show first/last 4 bytes for readability
        write!(
            f,
            "Digest(0x{}...{})",
            hex::encode(&self.bytes[..4]),
            hex::encode(&self.bytes[DIGEST_SIZE - 4..])
        )
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::str::FromStr for Digest {
    type Err = AttestorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// Serde implementation that uses 0x-prefixed hex encoding
impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const AA_HEX: &str = "aa00000000000000000000000000000000000000000000000000000000000000";

    #[test_case("aa00000000000000000000000000000000000000000000000000000000000000"; "bare hex")]
    #[test_case("0xaa00000000000000000000000000000000000000000000000000000000000000"; "prefixed")]
    #[test_case("0XAA00000000000000000000000000000000000000000000000000000000000000"; "uppercase prefix and digits")]
    #[test_case("  0xaa00000000000000000000000000000000000000000000000000000000000000  "; "surrounding whitespace")]
    #[test_case("'0xaa00000000000000000000000000000000000000000000000000000000000000'"; "quoted")]
    #[test_case("0xaa000000000000000000000000000000\n00000000000000000000000000000000"; "embedded newline")]
    fn test_parse_accepts_messy_input(input: &str) {
        let digest = Digest::parse(input).unwrap();
        assert_eq!(digest.to_hex(), format!("0x{AA_HEX}"));
    }

    #[test_case(""; "empty")]
    #[test_case("0x"; "prefix only")]
    #[test_case("aa00"; "too short")]
    #[test_case("0xgg00000000000000000000000000000000000000000000000000000000000000"; "non hex digits")]
    #[test_case("0xaa0000000000000000000000000000000000000000000000000000000000000000"; "too long")]
    fn test_parse_rejects_bad_input(input: &str) {
        assert!(matches!(
            Digest::parse(input),
            Err(AttestorError::InvalidDigest(_))
        ));
    }

    #[test]
    fn test_from_bytes_length_checked() {
        assert!(Digest::from_bytes(&[0u8; 32]).is_ok());
        assert!(Digest::from_bytes(&[0u8; 31]).is_err());
        assert!(Digest::from_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_zero_digest() {
        assert!(Digest::ZERO.is_zero());
        assert!(!Digest::from_array([0x01; 32]).is_zero());
        assert_eq!(Digest::default(), Digest::ZERO);
    }

    #[test]
    fn test_debug_is_truncated() {
        let digest = Digest::from_array([0xAB; 32]);
        let debug = format!("{digest:?}");
        assert_eq!(debug, "Digest(0xabababab...abababab)");
    }

    #[test]
    fn test_serde_roundtrip_as_hex_string() {
        let digest = Digest::from_array([0x42; 32]);
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));

        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    proptest! {
        #[test]
        fn prop_hex_roundtrip(bytes in proptest::array::uniform32(any::<u8>())) {
            let digest = Digest::from_array(bytes);
            let parsed = Digest::parse(&digest.to_hex()).unwrap();
            prop_assert_eq!(parsed, digest);
        }
    }
}
