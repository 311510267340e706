//! Submitter identity type.
//!
//! A [`SubmitterId`] is the 160-bit account identifier of the caller that
//! performed a registration. The registry accepts it as supplied; it does
//! no authentication.

use serde::{Deserialize, Serialize};
use sha3::{Digest as _, Keccak256};

use crate::constants::{SUBMITTER_HEX_LEN, SUBMITTER_SIZE};
use crate::error::{AttestorError, Result};

/// A 160-bit submitter identity.
///
/// Rendered in EIP-55 mixed-case checksum form, which is how registration
/// owners are displayed to verifiers. The all-zero identity is the sentinel
/// returned for digests that were never registered.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmitterId {
    bytes: [u8; SUBMITTER_SIZE],
}

impl SubmitterId {
    /// The zero identity, reported for unregistered digests.
    pub const ZERO: SubmitterId = SubmitterId {
        bytes: [0u8; SUBMITTER_SIZE],
    };

    /// Creates an identity from raw bytes.
    ///
    /// # Errors
    /// Returns an error if `bytes` is not exactly `SUBMITTER_SIZE` long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SUBMITTER_SIZE {
            return Err(AttestorError::InvalidSubmitter(format!(
                "expected {} bytes, got {}",
                SUBMITTER_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; SUBMITTER_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates an identity from a fixed-size array.
    pub const fn from_array(bytes: [u8; SUBMITTER_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parses an identity from a hex string.
    ///
    /// Strips surrounding quotes and any whitespace, then requires an
    /// optional `0x`/`0X` prefix followed by exactly 40 hex characters.
    /// Case is ignored; no checksum verification is performed.
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

        if clean.len() != SUBMITTER_HEX_LEN {
            return Err(AttestorError::InvalidSubmitter(format!(
                "expected {} hex characters, got {}",
                SUBMITTER_HEX_LEN,
                clean.len()
            )));
        }

        let bytes = hex::decode(clean.to_lowercase())
            .map_err(|e| AttestorError::InvalidSubmitter(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the raw bytes of the identity.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the EIP-55 mixed-case checksum encoding.
    ///
    /// A hex character is uppercased when the corresponding nibble of
    /// `keccak256(lowercase_hex)` is >= 8.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.bytes);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(2 + SUBMITTER_HEX_LEN);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Returns true if this is the zero sentinel identity.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl std::fmt::Debug for SubmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SubmitterId({})", self.to_checksum())
    }
}

impl Default for SubmitterId {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::str::FromStr for SubmitterId {
    type Err = AttestorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SubmitterId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for SubmitterId {
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
    use test_case::test_case;

    // Checksum vectors from EIP-55.
    #[test_case("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")]
    #[test_case("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359", "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359")]
    #[test_case("0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb", "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB")]
    #[test_case("0xd1220a0cf47c7b9be7a2e6ba89f429762e7b9adb", "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb")]
    #[test_case("0x52908400098527886e0f7030069857d2e4169ee7", "0x52908400098527886E0F7030069857D2E4169EE7")]
    fn test_eip55_checksum(lower: &str, expected: &str) {
        let id = SubmitterId::parse(lower).unwrap();
        assert_eq!(id.to_checksum(), expected);
    }

    #[test_case(" '0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed' "; "quoted and spaced")]
    #[test_case("0X5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"; "all caps")]
    #[test_case("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"; "no prefix")]
    fn test_parse_lenient(input: &str) {
        let id = SubmitterId::parse(input).unwrap();
        assert_eq!(id.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test_case("0x1234"; "too short")]
    #[test_case("0xzz08400098527886e0f7030069857d2e4169ee7z"; "non hex")]
    #[test_case(""; "empty")]
    fn test_parse_rejects_bad_input(input: &str) {
        assert!(matches!(
            SubmitterId::parse(input),
            Err(AttestorError::InvalidSubmitter(_))
        ));
    }

    #[test]
    fn test_zero_identity() {
        assert!(SubmitterId::ZERO.is_zero());
        assert_eq!(SubmitterId::default(), SubmitterId::ZERO);
        assert_eq!(
            SubmitterId::ZERO.to_checksum(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = SubmitterId::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\"");

        let back: SubmitterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
